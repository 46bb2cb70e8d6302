//! The command registry.
//!
//! A process-wide table mapping stable string identifiers to asynchronous
//! side-effecting operations. Registration is idempotent (last write
//! wins). Executing an unknown identifier is a non-fatal error surfaced to
//! the diagnostics channel; it never crashes the process. `invoke` is
//! fire-and-forget: it spawns the execution and returns immediately, so
//! the input-handling path never blocks; two invocations of the same
//! identifier run concurrently, the registry provides no mutual
//! exclusion. Commands that call other commands await them sequentially
//! through [`CommandRegistry::execute`].

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock, RwLock, Weak};

use vellum_core::{Action, Diagnostic, Severity, Store};
use vellum_ports::{ClipboardPort, FileSystemPort, SettingsPort};
use vellum_proc::ProcessManager;

use crate::{CommandError, CommandResult};

/// Future returned by a command handler.
pub type CommandFuture = Pin<Box<dyn Future<Output = CommandResult<()>> + Send>>;

type Handler = dyn Fn(Arc<CommandContext>, Vec<String>) -> CommandFuture + Send + Sync;

/// A named, asynchronously executable command.
pub struct Command {
    id: String,
    title: String,
    handler: Box<Handler>,
}

impl Command {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        handler: impl Fn(Arc<CommandContext>, Vec<String>) -> CommandFuture + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            handler: Box::new(handler),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display title for the palette.
    pub fn title(&self) -> &str {
        &self.title
    }
}

/// Everything a command effect may touch: the store plus the external
/// ports. Effects call the ports and dispatch transitions; they never
/// mutate state directly.
pub struct CommandContext {
    pub store: Arc<Store>,
    pub fs: Arc<dyn FileSystemPort>,
    pub clipboard: Arc<dyn ClipboardPort>,
    pub settings: Arc<dyn SettingsPort>,
    pub processes: Arc<ProcessManager>,
    registry: OnceLock<Weak<CommandRegistry>>,
}

impl CommandContext {
    pub fn new(
        store: Arc<Store>,
        fs: Arc<dyn FileSystemPort>,
        clipboard: Arc<dyn ClipboardPort>,
        settings: Arc<dyn SettingsPort>,
        processes: Arc<ProcessManager>,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            fs,
            clipboard,
            settings,
            processes,
            registry: OnceLock::new(),
        })
    }

    /// The registry this context is installed in. Used by commands that
    /// invoke other commands.
    pub fn registry(&self) -> Option<Arc<CommandRegistry>> {
        self.registry.get().and_then(Weak::upgrade)
    }

    /// Pushes one diagnostic and logs it.
    pub fn diagnose(&self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Error => tracing::warn!("{message}"),
            Severity::Warning => tracing::warn!("{message}"),
            Severity::Info => tracing::info!("{message}"),
        }
        self.store.dispatch(Action::PushDiagnostic {
            diagnostic: Diagnostic { severity, message },
        });
    }
}

/// The process-wide command table.
pub struct CommandRegistry {
    commands: RwLock<HashMap<String, Arc<Command>>>,
    ctx: Arc<CommandContext>,
}

impl CommandRegistry {
    /// Builds a registry bound to `ctx` and wires the back-reference so
    /// command bodies can reach the registry through their context.
    pub fn new(ctx: Arc<CommandContext>) -> Arc<Self> {
        let registry = Arc::new(Self {
            commands: RwLock::new(HashMap::new()),
            ctx: ctx.clone(),
        });
        let _ = ctx.registry.set(Arc::downgrade(&registry));
        registry
    }

    /// Adds or overwrites a command by identifier.
    pub fn register(&self, command: Command) {
        self.commands
            .write()
            .expect("command table lock poisoned")
            .insert(command.id.clone(), Arc::new(command));
    }

    /// Runs a command to completion. Unknown identifiers and failing
    /// effects surface one diagnostic and return the error; the caller
    /// decides whether to propagate further.
    pub async fn execute(&self, id: &str, args: Vec<String>) -> CommandResult<()> {
        let command = {
            let table = self.commands.read().expect("command table lock poisoned");
            table.get(id).cloned()
        };
        let Some(command) = command else {
            self.ctx
                .diagnose(Severity::Error, format!("Unknown command: {id}"));
            return Err(CommandError::UnknownCommand(id.to_string()));
        };

        tracing::debug!(command = id, ?args, "executing");
        match (command.handler)(self.ctx.clone(), args).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.ctx
                    .diagnose(Severity::Error, format!("{id}: {e}"));
                Err(e)
            }
        }
    }

    /// Fire-and-forget execution: spawns the command and returns without
    /// blocking the input-handling path. Errors have already been
    /// surfaced as diagnostics by the time the task finishes.
    pub fn invoke(self: &Arc<Self>, id: &str, args: Vec<String>) {
        let registry = self.clone();
        let id = id.to_string();
        tokio::spawn(async move {
            let _ = registry.execute(&id, args).await;
        });
    }

    /// All registered identifiers, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .commands
            .read()
            .expect("command table lock poisoned")
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Palette filter: case-insensitive substring match over identifiers
    /// and titles.
    pub fn matching(&self, query: &str) -> Vec<(String, String)> {
        let needle = query.to_lowercase();
        let mut hits: Vec<(String, String)> = self
            .commands
            .read()
            .expect("command table lock poisoned")
            .values()
            .filter(|c| {
                needle.is_empty()
                    || c.id.to_lowercase().contains(&needle)
                    || c.title.to_lowercase().contains(&needle)
            })
            .map(|c| (c.id.clone(), c.title.clone()))
            .collect();
        hits.sort();
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vellum_core::AppState;
    use vellum_ports::{JsonSettings, LocalFs, MemoryClipboard};

    fn test_ctx() -> Arc<CommandContext> {
        let dir = std::env::temp_dir().join("vellum-registry-tests");
        CommandContext::new(
            Arc::new(Store::new(AppState::new())),
            Arc::new(LocalFs::new()),
            Arc::new(MemoryClipboard::new()),
            Arc::new(JsonSettings::at_path(dir.join("settings.json"))),
            Arc::new(ProcessManager::new()),
        )
    }

    #[tokio::test]
    async fn register_is_idempotent_by_id() {
        let ctx = test_ctx();
        let registry = CommandRegistry::new(ctx);
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let hits = hits.clone();
            registry.register(Command::new("test.ping", "Ping", move |_, _| {
                let hits = hits.clone();
                Box::pin(async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
            }));
        }

        assert_eq!(registry.ids(), vec!["test.ping"]);
        registry.execute("test.ping", vec![]).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_command_is_nonfatal_and_diagnosed() {
        let ctx = test_ctx();
        let store = ctx.store.clone();
        let registry = CommandRegistry::new(ctx);

        let result = registry.execute("no.such.command", vec![]).await;
        assert!(matches!(result, Err(CommandError::UnknownCommand(_))));
        let state = store.get_state();
        assert_eq!(state.diagnostics.len(), 1);
        assert!(state.diagnostics[0].message.contains("no.such.command"));
    }

    #[tokio::test]
    async fn failing_command_pushes_one_diagnostic() {
        let ctx = test_ctx();
        let store = ctx.store.clone();
        let registry = CommandRegistry::new(ctx);
        registry.register(Command::new("test.fail", "Fail", |_, _| {
            Box::pin(async { Err(CommandError::Usage("boom".into())) })
        }));

        assert!(registry.execute("test.fail", vec![]).await.is_err());
        assert_eq!(store.get_state().diagnostics.len(), 1);
    }

    #[tokio::test]
    async fn invoke_does_not_block() {
        let ctx = test_ctx();
        let registry = CommandRegistry::new(ctx);
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let tx = std::sync::Mutex::new(Some(tx));
        registry.register(Command::new("test.signal", "Signal", move |_, _| {
            let tx = tx.lock().unwrap().take();
            Box::pin(async move {
                if let Some(tx) = tx {
                    let _ = tx.send(());
                }
                Ok(())
            })
        }));

        registry.invoke("test.signal", vec![]);
        tokio::time::timeout(std::time::Duration::from_secs(5), rx)
            .await
            .expect("invoked command never ran")
            .unwrap();
    }

    #[tokio::test]
    async fn matching_filters_by_substring() {
        let ctx = test_ctx();
        let registry = CommandRegistry::new(ctx);
        registry.register(Command::new("file.save", "Save File", |_, _| {
            Box::pin(async { Ok(()) })
        }));
        registry.register(Command::new("tab.next", "Next Tab", |_, _| {
            Box::pin(async { Ok(()) })
        }));

        let hits = registry.matching("save");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, "file.save");
        assert_eq!(registry.matching("").len(), 2);
    }
}
