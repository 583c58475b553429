use rapport::client::*;
use rapport::domain_model::PageSize;
use rapport::logger::*;
use rapport::settings::*;
use serde_json::{Value, json};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    info!(
        store = %project_settings.store.backend,
        session = %project_settings.session.backend,
        publisher = %project_settings.notification.publisher,
        "settings loaded"
    );
    logger.reload_from_config(&LogConfig::from(&project_settings.log))?;

    let Some(command) = cli.command else {
        anyhow::bail!("no command given, see --help");
    };

    let token = cli
        .token
        .or_else(|| std::env::var("RAPPORT_ACCESS_TOKEN").ok());
    let session = build_session(
        &project_settings.session,
        cli.as_user.map(|user| user.0),
        token,
    )?;
    let ctx = ClientContext::try_new(&project_settings, session).await?;

    let result = run(&ctx, command).await;
    ctx.shutdown().await;

    println!("{}", serde_json::to_string_pretty(&result?)?);
    Ok(())
}

async fn run(ctx: &ClientContext, command: Command) -> anyhow::Result<Value> {
    let value = match command {
        Command::Status { other } => json!({ "status": ctx.friends.friendship_status(other.0).await }),
        Command::Send { target } => json!({ "ok": ctx.friends.send_friend_request(target.0).await }),
        Command::Accept { requester } => {
            json!({ "ok": ctx.friends.accept_friend_request(requester.0).await? })
        }
        Command::Reject { requester } => {
            json!({ "ok": ctx.friends.reject_friend_request(requester.0).await })
        }
        Command::Cancel { friend } => json!({ "ok": ctx.friends.cancel_friend_request(friend.0).await }),
        Command::Requests => serde_json::to_value(ctx.friends.refresh_pending().await?)?,
        Command::Friends => serde_json::to_value(ctx.friends.list_friends().await?)?,
        Command::Notifications { unread, limit } => {
            let me = ctx.session.current_user().await?;
            let notifications = ctx
                .notification_service
                .list_notifications(me, PageSize(limit), unread)
                .await?;
            serde_json::to_value(notifications)?
        }
        Command::Read { id } => {
            let me = ctx.session.current_user().await?;
            ctx.notification_service.mark_read(me, id).await?;
            json!({ "ok": true })
        }
        Command::ReadAll => {
            let me = ctx.session.current_user().await?;
            json!({ "marked": ctx.notification_service.mark_all_read(me).await? })
        }
        Command::DeleteNotification { id } => {
            let me = ctx.session.current_user().await?;
            ctx.notification_service.delete_notification(me, id).await?;
            json!({ "ok": true })
        }
    };
    Ok(value)
}
