//! Process-wide engine binding.
//!
//! The binding is created on first use and lives for the rest of the process.
use super::process::{CommandSet, ProcessEngine};
use super::Engine;
use std::sync::{Arc, OnceLock};

static BINDING: OnceLock<Arc<ProcessEngine>> = OnceLock::new();

/// Return the shared engine, creating it from `commands` on first use.
///
/// Later calls return the existing instance and ignore `commands`.
pub fn shared(commands: CommandSet) -> Arc<dyn Engine> {
    let engine = BINDING.get_or_init(|| {
        tracing::debug!("binding process engine");
        Arc::new(ProcessEngine::new(commands))
    });
    Arc::clone(engine) as Arc<dyn Engine>
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commands(service: &str) -> CommandSet {
        CommandSet {
            compatibility: vec!["true".to_string()],
            conditioning: None,
            configuration: vec!["true".to_string()],
            service: vec![service.to_string()],
        }
    }

    #[test]
    fn binding_is_created_once() {
        let first = shared(commands("true"));
        let second = shared(commands("false"));
        assert_eq!(
            Arc::as_ptr(&first) as *const (),
            Arc::as_ptr(&second) as *const ()
        );
    }
}
