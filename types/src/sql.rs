// Stores an enum as its text spelling in a Text/Varchar column.
macro_rules! text_sql {
    ($name:ty) => {
        impl diesel::serialize::ToSql<diesel::sql_types::Text, diesel::pg::Pg> for $name {
            fn to_sql<'b>(
                &'b self,
                out: &mut diesel::serialize::Output<'b, '_, diesel::pg::Pg>,
            ) -> diesel::serialize::Result {
                use std::io::Write;

                out.write_all(self.as_str().as_bytes())?;
                return Ok(diesel::serialize::IsNull::No);
            }
        }

        impl diesel::deserialize::FromSql<diesel::sql_types::Text, diesel::pg::Pg> for $name {
            fn from_sql(bytes: diesel::pg::PgValue<'_>) -> diesel::deserialize::Result<Self> {
                let value = std::str::from_utf8(bytes.as_bytes())?;
                return Ok(value.parse::<$name>()?);
            }
        }
    };
}

pub(crate) use text_sql;
