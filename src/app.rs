use anyhow::{Context, Result};

use crate::{
    cli::{Cli, Command},
    domain, engine, infra,
    ui::{self, conversation_rendering::render_conversation},
    usecases::{self, bootstrap, context::AppContext},
};

const CORE_THREAD_UNAVAILABLE: &str = "CORE_THREAD_UNAVAILABLE";

pub fn run(cli: Cli) -> Result<()> {
    let context = bootstrap::bootstrap(cli.config.as_deref())?;

    tracing::debug!(
        ui = ui::module_name(),
        domain = domain::module_name(),
        engine = engine::module_name(),
        usecases = usecases::module_name(),
        infra = infra::module_name(),
        "module boundaries loaded"
    );

    println!("{}", execute(&context, &cli.command)?);
    Ok(())
}

/// Binds the requested conversation, applies the command and renders the
/// resulting snapshot.
fn execute(context: &AppContext, command: &Command) -> Result<String> {
    let target = command.conversation();
    let view_model = bootstrap::compose_view_model(context);

    view_model
        .find_conversation(&target.local, &target.remote)
        .blocking_recv()
        .context("conversation lookup was abandoned")?
        .with_context(|| {
            format!(
                "failed to open conversation {} -> {}",
                target.local, target.remote
            )
        })?;

    if let Command::Send { text, .. } = command {
        view_model.set_draft(text.as_str());
        view_model.send_text();
    }

    if !context.core.wait_settled() {
        tracing::warn!(code = CORE_THREAD_UNAVAILABLE, "core thread stopped early");
    }

    let rendered = render_conversation(&view_model.snapshot());
    view_model.tear_down();
    context.core.wait_settled();

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        cli::ConversationArgs,
        engine::memory::MemoryEngine,
        infra::config::AppConfig,
        test_support::{address, sample_engine},
    };

    fn context() -> (AppContext, Arc<MemoryEngine>) {
        let (core, engine) = sample_engine();
        (
            AppContext::new(AppConfig::default(), core, engine.clone()),
            engine,
        )
    }

    fn alice() -> ConversationArgs {
        ConversationArgs {
            local: "sip:me@example.org".to_owned(),
            remote: "sip:alice@example.org".to_owned(),
        }
    }

    #[test]
    fn show_renders_bound_conversation() {
        let (context, _engine) = context();

        let rendered = execute(&context, &Command::Show(alice())).expect("show should succeed");

        assert!(rendered.starts_with("Alice"));
        assert!(rendered.contains("Alice Liddell:"));
        assert!(rendered.contains("hi there"));
        assert!(rendered.contains("You:"));
    }

    #[test]
    fn send_appends_message_and_releases_listener() {
        let (context, engine) = context();

        let rendered = execute(
            &context,
            &Command::Send {
                conversation: alice(),
                text: "  on my way ".to_owned(),
            },
        )
        .expect("send should succeed");

        assert!(rendered.ends_with("on my way"));
        let conversation = engine
            .conversation(
                &address("sip:me@example.org"),
                &address("sip:alice@example.org"),
            )
            .expect("conversation");
        assert_eq!(conversation.history_len(), 3);
        assert_eq!(conversation.listener_count(), 0);
    }

    #[test]
    fn unknown_conversation_is_an_error() {
        let (context, _engine) = context();

        let error = execute(
            &context,
            &Command::Show(ConversationArgs {
                local: "sip:me@example.org".to_owned(),
                remote: "sip:nobody@example.org".to_owned(),
            }),
        )
        .expect_err("lookup must fail");

        assert!(error.to_string().contains("sip:nobody@example.org"));
    }
}
