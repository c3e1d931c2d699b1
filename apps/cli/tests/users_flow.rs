//! The demo sequence against an in-memory `Users` table

use std::collections::HashMap;
use std::sync::Arc;

use azsecrets_cli::demo;
use azsecrets_cli::users::{
    ADD_USER_SQL, DELETE_USER_SQL, LIST_USERS_SQL, RESET_IDENTITY_SQL, TEST_CONNECTION_SQL,
    UPDATE_USER_SQL,
};
use azsecrets_cli::{NewUser, Users};
use azsecrets_keystore::ProviderRegistry;
use azsecrets_resource::testing::{MockConnector, StatementResult};
use azsecrets_resource::{ConnectionFactory, DriverError, Row, Value};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

#[derive(Debug, Clone)]
struct StoredUser {
    id: i64,
    name: String,
    email: String,
    password: String,
}

/// Just enough of SQL Server's `Users` table for the demo statements
#[derive(Debug)]
struct UsersTable {
    rows: Vec<StoredUser>,
    identity: i64,
}

impl UsersTable {
    fn seeded() -> Self {
        Self {
            rows: vec![StoredUser {
                id: 1,
                name: "Ana Mora".into(),
                email: "amora@ulacit.ed.cr".into(),
                password: "111111".into(),
            }],
            identity: 1,
        }
    }

    fn run(&mut self, sql: &str, params: &[Value]) -> Result<StatementResult, DriverError> {
        let text = |i: usize| params[i].as_str().unwrap_or_default().to_string();
        let id = || params[0].as_i64().unwrap_or_default();

        match sql {
            TEST_CONNECTION_SQL => Ok(StatementResult::Rows(vec![Row::new(vec![(
                String::new(),
                Value::Int(1),
            )])])),
            LIST_USERS_SQL => Ok(StatementResult::Rows(
                self.rows
                    .iter()
                    .map(|u| {
                        [
                            ("Id", Value::Int(u.id)),
                            ("Name", Value::from(u.name.as_str())),
                            ("Email", Value::from(u.email.as_str())),
                            ("Password", Value::from(u.password.as_str())),
                        ]
                        .into_iter()
                        .collect()
                    })
                    .collect(),
            )),
            ADD_USER_SQL => {
                self.identity += 1;
                self.rows.push(StoredUser {
                    id: self.identity,
                    name: text(0),
                    email: text(1),
                    password: text(2),
                });
                Ok(StatementResult::Affected(1))
            }
            UPDATE_USER_SQL => {
                let target = id();
                let mut affected = 0;
                for user in self.rows.iter_mut().filter(|u| u.id == target) {
                    user.name = text(1);
                    user.email = text(2);
                    user.password = text(3);
                    affected += 1;
                }
                Ok(StatementResult::Affected(affected))
            }
            DELETE_USER_SQL => {
                let target = id();
                let before = self.rows.len();
                self.rows.retain(|u| u.id != target);
                Ok(StatementResult::Affected((before - self.rows.len()) as u64))
            }
            RESET_IDENTITY_SQL => {
                self.identity = 1;
                Ok(StatementResult::Affected(0))
            }
            other => Err(DriverError::Rejected(format!("unsupported statement: {other}"))),
        }
    }
}

fn env() -> HashMap<String, String> {
    [
        ("AZURE_TENANT_ID", "72f988bf-86f1-41af-91ab-2d7cd011db47"),
        ("AZURE_CLIENT_ID", "client-1"),
        ("AZURE_CLIENT_SECRET", "secret-1"),
        (
            "DB_CONNECTION_STRING",
            "Server=tcp:demo.database.windows.net,1433;Initial Catalog=Users;\
             Column Encryption Setting=Enabled",
        ),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn connector_over(table: &Arc<Mutex<UsersTable>>) -> MockConnector {
    let table = Arc::clone(table);
    MockConnector::new().with_handler(move |sql, params| table.lock().run(sql, params))
}

fn factory(
    connector: &MockConnector,
    env: HashMap<String, String>,
) -> ConnectionFactory<MockConnector, HashMap<String, String>> {
    ConnectionFactory::new(connector.clone())
        .with_env(env)
        .with_registry(Box::leak(Box::new(ProviderRegistry::new())))
}

#[tokio::test]
async fn demo_runs_full_sequence() {
    let table = Arc::new(Mutex::new(UsersTable::seeded()));
    let connector = connector_over(&table);
    let factory = factory(&connector, env());
    let mut out = Vec::new();

    demo::run(&factory, &mut out).await.expect("demo should succeed");

    let expected = "\
~ Azure Secrets~
Testing connection...
Getting users...
1 - Ana Mora - amora@ulacit.ed.cr - 111111
Adding user...
Getting users...
1 - Ana Mora - amora@ulacit.ed.cr - 111111
2 - Diego Rubí - drubis628@ulacit.ed.cr - 123456
Updating user...
Getting users...
1 - Ana Mora - amora@ulacit.ed.cr - 111111
2 - Diego Rubí Salas - drubis628@ulacit.ed.cr - 654321
Deleting user...
Getting users...
1 - Ana Mora - amora@ulacit.ed.cr - 111111
Resetting identity...
Done.
";
    assert_eq!(String::from_utf8(out).unwrap(), expected);

    // one connection per operation, each closed
    assert_eq!(connector.open_count(), 9);
    assert_eq!(connector.close_count(), 9);
    assert_eq!(factory.registry().provider_names(), vec!["AZURE_KEY_VAULT".to_string()]);

    let sql: Vec<String> = connector.statements().into_iter().map(|s| s.sql).collect();
    assert_eq!(
        sql,
        [
            TEST_CONNECTION_SQL,
            LIST_USERS_SQL,
            ADD_USER_SQL,
            LIST_USERS_SQL,
            UPDATE_USER_SQL,
            LIST_USERS_SQL,
            DELETE_USER_SQL,
            LIST_USERS_SQL,
            RESET_IDENTITY_SQL,
        ]
    );
}

#[tokio::test]
async fn update_binds_id_first() {
    let table = Arc::new(Mutex::new(UsersTable::seeded()));
    let connector = connector_over(&table);
    let factory = factory(&connector, env());

    Users::new(&factory)
        .update(&demo::updated_demo_user())
        .await
        .unwrap();

    let statement = &connector.statements()[0];
    assert_eq!(
        statement.params,
        vec![
            Value::Int(2),
            Value::from("Diego Rubí Salas"),
            Value::from("drubis628@ulacit.ed.cr"),
            Value::from("654321"),
        ]
    );
}

#[tokio::test]
async fn reseed_makes_next_insert_reuse_id() {
    let table = Arc::new(Mutex::new(UsersTable::seeded()));
    let connector = connector_over(&table);
    let factory = factory(&connector, env());
    let users = Users::new(&factory);

    users.add(&demo::demo_user()).await.unwrap();
    users.add(&NewUser::new("Tercero", "t@ulacit.ed.cr", "333")).await.unwrap();
    assert_eq!(users.delete(2).await.unwrap(), 1);
    assert_eq!(users.delete(3).await.unwrap(), 1);
    assert_eq!(users.delete(3).await.unwrap(), 0);
    users.reset_identity().await.unwrap();
    users.add(&demo::demo_user()).await.unwrap();

    let ids: Vec<i32> = users.list().await.unwrap().iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[tokio::test]
async fn failure_stops_sequence_and_closes_connection() {
    let table = Arc::new(Mutex::new(UsersTable::seeded()));
    let inner = Arc::clone(&table);
    let connector = MockConnector::new().with_handler(move |sql, params| {
        if sql == UPDATE_USER_SQL {
            return Err(DriverError::Rejected("Operand type clash".into()));
        }
        inner.lock().run(sql, params)
    });
    let factory = factory(&connector, env());
    let mut out = Vec::new();

    let err = demo::run(&factory, &mut out).await.unwrap_err();

    assert!(format!("{err:#}").contains("Failed to update user 2"));
    let printed = String::from_utf8(out).unwrap();
    assert!(printed.ends_with("Updating user...\n"));
    assert_eq!(connector.open_count(), connector.close_count());
}

#[tokio::test]
async fn missing_identity_stops_before_connecting() {
    let mut env = env();
    env.remove("AZURE_CLIENT_SECRET");
    let connector = MockConnector::new();
    let factory = factory(&connector, env);
    let mut out = Vec::new();

    let err = demo::run(&factory, &mut out).await.unwrap_err();

    assert!(format!("{err:#}").contains("missing identity configuration"));
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "~ Azure Secrets~\nTesting connection...\n"
    );
    assert_eq!(connector.open_count(), 0);
    assert!(!factory.registry().is_registered());
}
