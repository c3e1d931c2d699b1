//! CRUD operations on the `Users` table.
//!
//! Every operation borrows one connection from the factory, runs a single
//! parameterised statement and closes the connection again, even when the
//! statement fails.

use std::fmt;

use azsecrets_credential::EnvSource;
use azsecrets_resource::{Connection, ConnectionFactory, Connector, DriverError, Error, Row, Value};
use futures::FutureExt;
use tracing::{info, instrument};

/// Round-trip check
pub const TEST_CONNECTION_SQL: &str = "SELECT 1";
/// All users
pub const LIST_USERS_SQL: &str = "SELECT Id, Name, Email, Password FROM Users";
/// Insert; the server assigns `Id`
pub const ADD_USER_SQL: &str = "INSERT INTO Users (Name, Email, Password) VALUES (@P1, @P2, @P3)";
/// Update by id
pub const UPDATE_USER_SQL: &str =
    "UPDATE Users SET Name = @P2, Email = @P3, Password = @P4 WHERE Id = @P1";
/// Delete by id
pub const DELETE_USER_SQL: &str = "DELETE FROM Users WHERE Id = @P1";
/// Reseed the identity column to 1
pub const RESET_IDENTITY_SQL: &str = "DBCC CHECKIDENT ('[dbo].[Users]', RESEED, 1)";

/// A row of `Users`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Identity column
    pub id: i32,
    /// Display name
    pub name: String,
    /// Contact address
    pub email: String,
    /// Stored in an encrypted column
    pub password: String,
}

impl User {
    /// Read `Id`, `Name`, `Email` and `Password` from `row`.
    ///
    /// The text columns print whatever the cell holds: NULL as an empty
    /// string, undecrypted ciphertext as hex. Only `Id` must be an int.
    pub fn from_row(row: &Row) -> Result<Self, DriverError> {
        let id = row.int("Id")?;
        let id = i32::try_from(id).map_err(|_| DriverError::Column {
            column: "Id".to_string(),
            reason: format!("{id} does not fit in an int"),
        })?;
        Ok(Self {
            id,
            name: row.display("Name")?,
            email: row.display("Email")?,
            password: row.display("Password")?,
        })
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} - {} - {}", self.id, self.name, self.email, self.password)
    }
}

/// Insert payload for [`Users::add`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Display name
    pub name: String,
    /// Contact address
    pub email: String,
    /// Plaintext password, encrypted by the driver
    pub password: String,
}

impl NewUser {
    /// Payload from its three fields
    pub fn new(name: impl Into<String>, email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// The `Users` table, reached through `factory`
pub struct Users<'f, C, E> {
    factory: &'f ConnectionFactory<C, E>,
}

impl<'f, C, E> Users<'f, C, E>
where
    C: Connector,
    E: EnvSource + Send + Sync,
{
    /// Operations over connections from `factory`
    pub fn new(factory: &'f ConnectionFactory<C, E>) -> Self {
        Self { factory }
    }

    /// Open a connection and run `SELECT 1`
    #[instrument(skip(self))]
    pub async fn test_connection(&self) -> Result<(), Error> {
        self.factory
            .with_connection(|conn| {
                async move { conn.query(TEST_CONNECTION_SQL, &[]).await.map(drop) }.boxed()
            })
            .await?;
        info!("Connection test passed");
        Ok(())
    }

    /// Every user, in server order
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<User>, Error> {
        let users = self
            .factory
            .with_connection(|conn| {
                async move {
                    let rows = conn.query(LIST_USERS_SQL, &[]).await?;
                    rows.iter().map(User::from_row).collect::<Result<Vec<_>, _>>()
                }
                .boxed()
            })
            .await?;
        info!(rows = users.len(), "Listed users");
        Ok(users)
    }

    /// Insert `user`; returns rows affected
    #[instrument(skip_all)]
    pub async fn add(&self, user: &NewUser) -> Result<u64, Error> {
        let params = vec![
            Value::from(user.name.as_str()),
            Value::from(user.email.as_str()),
            Value::from(user.password.as_str()),
        ];
        let rows = self.execute(ADD_USER_SQL, params).await?;
        info!(rows, "Added user");
        Ok(rows)
    }

    /// Overwrite name, email and password of the user with `user.id`
    #[instrument(skip_all, fields(id = user.id))]
    pub async fn update(&self, user: &User) -> Result<u64, Error> {
        let params = vec![
            Value::from(user.id),
            Value::from(user.name.as_str()),
            Value::from(user.email.as_str()),
            Value::from(user.password.as_str()),
        ];
        let rows = self.execute(UPDATE_USER_SQL, params).await?;
        info!(rows, "Updated user");
        Ok(rows)
    }

    /// Delete the user with `id`
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<u64, Error> {
        let rows = self.execute(DELETE_USER_SQL, vec![Value::from(id)]).await?;
        info!(rows, "Deleted user");
        Ok(rows)
    }

    /// Reseed the identity column to 1
    #[instrument(skip(self))]
    pub async fn reset_identity(&self) -> Result<(), Error> {
        self.execute(RESET_IDENTITY_SQL, Vec::new()).await?;
        info!("Identity reseeded");
        Ok(())
    }

    async fn execute(&self, sql: &'static str, params: Vec<Value>) -> Result<u64, Error> {
        self.factory
            .with_connection(move |conn| async move { conn.execute(sql, &params).await }.boxed())
            .await
    }
}
