use std::{path::Path, sync::Arc};

use crate::{
    engine::{
        core_thread::CoreThread,
        fixture::{load_fixture, Fixture},
        memory::MemoryEngine,
    },
    infra::{self, config::FileConfigAdapter, contracts::ConfigAdapter, error::AppError},
    usecases::{context::AppContext, conversation_view_model::ConversationViewModel},
};

pub fn bootstrap(config_path: Option<&Path>) -> Result<AppContext, AppError> {
    let context = build_context(&FileConfigAdapter::new(config_path))?;
    infra::logging::init(&context.config.logging)?;

    tracing::debug!(
        conversations = context.engine.conversations().len(),
        "engine loaded"
    );

    Ok(context)
}

/// Builds a view model wired to the context's core thread and engine.
pub fn compose_view_model(context: &AppContext) -> ConversationViewModel {
    ConversationViewModel::new(
        context.core.clone(),
        context.engine.clone(),
        context.engine.contacts(),
        context.config.labels.composing_template(),
    )
}

fn build_context(config_adapter: &dyn ConfigAdapter) -> Result<AppContext, AppError> {
    let config = config_adapter.load()?;
    let core = CoreThread::start()?;

    let fixture = match config.engine.fixture.as_deref() {
        Some(path) => load_fixture(path)?,
        None => Fixture::default(),
    };
    let engine = Arc::new(MemoryEngine::from_fixture(fixture, &core));

    Ok(AppContext::new(config, core, engine))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::{
        domain::conversation_state::ConversationPhase,
        infra::{config::AppConfig, stubs::StubConfigAdapter},
        test_support::SAMPLE_FIXTURE,
    };

    #[test]
    fn builds_empty_engine_without_fixture() {
        let context =
            build_context(&StubConfigAdapter::default()).expect("context should build from defaults");

        assert_eq!(context.config, AppConfig::default());
        assert!(context.engine.conversations().is_empty());
    }

    #[test]
    fn loads_configured_fixture_and_composes_a_working_view_model() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(SAMPLE_FIXTURE.as_bytes())
            .expect("fixture should be writable");

        let mut config = AppConfig::default();
        config.engine.fixture = Some(file.path().to_path_buf());
        config.labels.composing_one = "{names} typing".to_owned();

        let context = build_context(&StubConfigAdapter { config }).expect("context should build");
        let view_model = compose_view_model(&context);

        view_model
            .find_conversation("sip:me@example.org", "sip:team@conference.example.org")
            .blocking_recv()
            .expect("lookup should be answered")
            .expect("lookup should succeed");

        let snapshot = view_model.snapshot();
        assert_eq!(snapshot.phase(), ConversationPhase::Bound);
        assert_eq!(snapshot.composing_label(), "Bob Marley typing");
    }

    #[test]
    fn missing_fixture_is_reported_with_its_path() {
        let mut config = AppConfig::default();
        config.engine.fixture = Some("./missing-fixture.toml".into());

        let error = build_context(&StubConfigAdapter { config })
            .err()
            .expect("missing fixture must fail");

        assert!(matches!(error, AppError::FixtureRead { .. }));
    }
}
