//! SQL Server / Azure SQL connector over `tiberius`

use async_trait::async_trait;
use azsecrets_keystore::ProviderRegistry;
use tiberius::{Client, ColumnData, Config, ToSql};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::debug;

use crate::connection_string::ConnectionString;
use crate::connector::{Connection, Connector, require_key_store};
use crate::error::DriverError;
use crate::value::{Row, Value};

type TdsClient = Client<Compat<TcpStream>>;

/// Opens TDS connections over TCP
#[derive(Debug, Clone, Copy, Default)]
pub struct TdsConnector;

impl TdsConnector {
    /// A new connector
    pub fn new() -> Self {
        Self
    }
}

/// An open TDS session
pub struct TdsConnection {
    client: TdsClient,
}

impl std::fmt::Debug for TdsConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TdsConnection").finish_non_exhaustive()
    }
}

#[async_trait]
impl Connector for TdsConnector {
    type Connection = TdsConnection;

    async fn open(
        &self,
        connection_string: &ConnectionString,
        registry: &ProviderRegistry,
    ) -> Result<TdsConnection, DriverError> {
        require_key_store(connection_string, registry)?;
        let config = Config::from_ado_string(&connection_string.to_driver_string())?;
        let client = connect(config).await?;
        Ok(TdsConnection { client })
    }
}

async fn connect(mut config: Config) -> Result<TdsClient, DriverError> {
    let tcp = TcpStream::connect(config.get_addr()).await?;
    tcp.set_nodelay(true)?;

    match Client::connect(config.clone(), tcp.compat_write()).await {
        Ok(client) => Ok(client),
        // Azure SQL gateways answer the first login with a redirect
        Err(tiberius::error::Error::Routing { host, port }) => {
            debug!(%host, port, "Following gateway redirect");
            config.host(&host);
            config.port(port);
            let tcp = TcpStream::connect(config.get_addr()).await?;
            tcp.set_nodelay(true)?;
            Ok(Client::connect(config, tcp.compat_write()).await?)
        }
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl Connection for TdsConnection {
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DriverError> {
        let params = bind(params);
        let result = self.client.execute(sql, &params).await?;
        Ok(result.total())
    }

    async fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DriverError> {
        let params = bind(params);
        let rows = self
            .client
            .query(sql, &params)
            .await?
            .into_first_result()
            .await?;
        Ok(rows.into_iter().map(convert_row).collect())
    }

    async fn close(self) -> Result<(), DriverError> {
        self.client.close().await?;
        Ok(())
    }
}

fn bind(params: &[Value]) -> Vec<&dyn ToSql> {
    params.iter().map(|p| p as &dyn ToSql).collect()
}

impl ToSql for Value {
    fn to_sql(&self) -> ColumnData<'_> {
        match self {
            Self::Null => ColumnData::String(None),
            Self::Bool(v) => ColumnData::Bit(Some(*v)),
            Self::Int(v) => ColumnData::I64(Some(*v)),
            Self::Float(v) => ColumnData::F64(Some(*v)),
            Self::Text(v) => ColumnData::String(Some(v.as_str().into())),
            Self::Binary(v) => ColumnData::Binary(Some(v.as_slice().into())),
        }
    }
}

fn convert_row(row: tiberius::Row) -> Row {
    let names: Vec<String> = row.columns().iter().map(|c| c.name().to_string()).collect();
    Row::new(names.into_iter().zip(row.into_iter().map(cell_value)).collect())
}

fn cell_value(data: ColumnData<'static>) -> Value {
    match data {
        ColumnData::U8(v) => v.map_or(Value::Null, |v| Value::Int(v.into())),
        ColumnData::I16(v) => v.map_or(Value::Null, |v| Value::Int(v.into())),
        ColumnData::I32(v) => v.map_or(Value::Null, |v| Value::Int(v.into())),
        ColumnData::I64(v) => v.map_or(Value::Null, Value::Int),
        ColumnData::F32(v) => v.map_or(Value::Null, |v| Value::Float(v.into())),
        ColumnData::F64(v) => v.map_or(Value::Null, Value::Float),
        ColumnData::Bit(v) => v.map_or(Value::Null, Value::Bool),
        ColumnData::String(v) => v.map_or(Value::Null, |s| Value::Text(s.into_owned())),
        ColumnData::Binary(v) => v.map_or(Value::Null, |b| Value::Binary(b.into_owned())),
        ColumnData::Guid(v) => v.map_or(Value::Null, |g| Value::Text(g.to_string())),
        // dates, numerics and xml are rendered as their debug form
        other => Value::Text(format!("{other:?}")),
    }
}
