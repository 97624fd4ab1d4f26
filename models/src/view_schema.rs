// Views from migrations/*_create_market_data. Diesel CLI does not print
// views, so these are maintained by hand.

diesel::table! {
    latest_prices (symbol) {
        symbol -> Varchar,
        price -> Numeric,
        price_change_percent -> Numeric,
        high_price -> Numeric,
        low_price -> Numeric,
        volume -> Numeric,
        timestamp -> Timestamptz,
    }
}

diesel::table! {
    latest_candles (symbol, interval) {
        symbol -> Varchar,
        interval -> Varchar,
        open_time -> Timestamptz,
        open_price -> Numeric,
        high_price -> Numeric,
        low_price -> Numeric,
        close_price -> Numeric,
        volume -> Numeric,
        close_time -> Timestamptz,
    }
}

diesel::table! {
    api_stats (endpoint) {
        endpoint -> Varchar,
        total_calls -> Int8,
        successful_calls -> Int8,
        failed_calls -> Int8,
        avg_response_time_ms -> Nullable<Numeric>,
        last_call -> Timestamptz,
    }
}
