use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    Postgres,
    Bigquery,
    Snowflake,
    Duckdb,
}

impl ConnectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionType::Postgres => "postgres",
            ConnectionType::Bigquery => "bigquery",
            ConnectionType::Snowflake => "snowflake",
            ConnectionType::Duckdb => "duckdb",
        }
    }
}

/// Connection definition as written in `publisher.connections.json`.
///
/// Exactly one of the protocol blocks is expected, matching `type`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub name: String,
    #[serde(rename = "type")]
    pub r#type: ConnectionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postgres_connection: Option<PostgresConnection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bigquery_connection: Option<BigqueryConnection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snowflake_connection: Option<SnowflakeConnection>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostgresConnection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_name: Option<String>,
    pub user_name: Option<String>,
    pub password: Option<String>,
    pub connection_string: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BigqueryConnection {
    pub default_project_id: Option<String>,
    pub billing_project_id: Option<String>,
    pub location: Option<String>,
    pub service_account_key_json: Option<String>,
    pub maximum_bytes_billed: Option<String>,
    pub query_timeout_milliseconds: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnowflakeConnection {
    pub account: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub warehouse: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub response_timeout_milliseconds: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_postgres_definition_with_wire_names() {
        let input = json!({
            "name": "warehouse",
            "type": "postgres",
            "postgresConnection": {
                "host": "db.internal",
                "port": 5432,
                "databaseName": "analytics",
                "userName": "reader"
            }
        });

        let conn: Connection = serde_json::from_value(input).unwrap();
        assert_eq!(conn.r#type, ConnectionType::Postgres);
        let pg = conn.postgres_connection.expect("postgres block");
        assert_eq!(pg.port, Some(5432));
        assert_eq!(pg.database_name.as_deref(), Some("analytics"));
        assert!(conn.bigquery_connection.is_none());
    }

    #[test]
    fn rejects_unknown_connection_type() {
        let input = json!({"name": "x", "type": "oracle"});
        assert!(serde_json::from_value::<Connection>(input).is_err());
    }
}
