//! The fixed demo sequence the binary runs

use std::io::Write;

use anyhow::Context;
use azsecrets_credential::EnvSource;
use azsecrets_resource::{ConnectionFactory, Connector};

use crate::users::{NewUser, User, Users};

/// Id the demo updates and then deletes
pub const DEMO_USER_ID: i32 = 2;

/// Row inserted by the demo
pub fn demo_user() -> NewUser {
    NewUser::new("Diego Rubí", "drubis628@ulacit.ed.cr", "123456")
}

/// Replacement values for [`DEMO_USER_ID`]
pub fn updated_demo_user() -> User {
    User {
        id: DEMO_USER_ID,
        name: "Diego Rubí Salas".to_string(),
        email: "drubis628@ulacit.ed.cr".to_string(),
        password: "654321".to_string(),
    }
}

/// Test the connection, then list, add, list, update, list, delete, list
/// and reseed, writing progress lines and rows to `out`.
///
/// Stops at the first failure.
pub async fn run<C, E, W>(factory: &ConnectionFactory<C, E>, out: &mut W) -> anyhow::Result<()>
where
    C: Connector,
    E: EnvSource + Send + Sync,
    W: Write,
{
    let users = Users::new(factory);

    writeln!(out, "~ Azure Secrets~")?;

    writeln!(out, "Testing connection...")?;
    users
        .test_connection()
        .await
        .context("Connection test failed")?;

    list(&users, out).await?;

    writeln!(out, "Adding user...")?;
    users
        .add(&demo_user())
        .await
        .context("Failed to add user")?;

    list(&users, out).await?;

    writeln!(out, "Updating user...")?;
    users
        .update(&updated_demo_user())
        .await
        .with_context(|| format!("Failed to update user {DEMO_USER_ID}"))?;

    list(&users, out).await?;

    writeln!(out, "Deleting user...")?;
    users
        .delete(DEMO_USER_ID)
        .await
        .with_context(|| format!("Failed to delete user {DEMO_USER_ID}"))?;

    list(&users, out).await?;

    writeln!(out, "Resetting identity...")?;
    users
        .reset_identity()
        .await
        .context("Failed to reset identity")?;

    writeln!(out, "Done.")?;
    out.flush()?;
    Ok(())
}

async fn list<C, E, W>(users: &Users<'_, C, E>, out: &mut W) -> anyhow::Result<()>
where
    C: Connector,
    E: EnvSource + Send + Sync,
    W: Write,
{
    writeln!(out, "Getting users...")?;
    let rows = users.list().await.context("Failed to list users")?;
    for user in &rows {
        writeln!(out, "{user}")?;
    }
    Ok(())
}
