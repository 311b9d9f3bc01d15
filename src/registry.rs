use crate::command::Command;
use crate::error::CommandError;
use tracing::debug;

/// Ordered collection of commands, keyed by name.
///
/// Registration order is preserved: it is the order used for the help listing
/// and for completion candidates.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: Vec<Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `command` under its name.
    ///
    /// A command registered under an existing name replaces the old one and
    /// takes over its position.
    pub fn register(&mut self, command: Command) -> &mut Self {
        match self.position(command.name()) {
            Some(index) => {
                debug!(command = command.name(), "replacing registered command");
                self.commands[index] = command;
            }
            None => {
                debug!(command = command.name(), "registering command");
                self.commands.push(command);
            }
        }
        self
    }

    /// Find a command by name.
    pub fn lookup(&self, name: &str) -> Result<&Command, CommandError> {
        self.get(name)
            .ok_or_else(|| CommandError::CommandNotFound(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|cmd| cmd.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// All commands in registration order.
    pub fn list(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(Command::name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.commands.iter().position(|cmd| cmd.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(name: &str) -> Command {
        Command::new(name, |_state, _out| Ok(()))
    }

    #[test]
    fn test_lookup_returns_registered_fields() {
        let mut registry = CommandRegistry::new();
        registry.register(
            noop("hello")
                .usage("[<name>]")
                .help_text("Greets somebody or the whole world"),
        );

        let cmd = registry.lookup("hello").unwrap();
        assert_eq!(cmd.name(), "hello");
        assert_eq!(cmd.usage_text(), "[<name>]");
        assert_eq!(cmd.help(), Some("Greets somebody or the whole world"));
    }

    #[test]
    fn test_lookup_unknown_fails() {
        let registry = CommandRegistry::new();
        assert_eq!(
            registry.lookup("nosuchcmd").unwrap_err(),
            CommandError::CommandNotFound("nosuchcmd".to_string())
        );
        assert!(registry.get("nosuchcmd").is_none());
    }

    #[test]
    fn test_list_keeps_registration_order() {
        let mut registry = CommandRegistry::new();
        registry
            .register(noop("zeta"))
            .register(noop("alpha"))
            .register(noop("mid"));

        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_reregister_replaces_in_place() {
        let mut registry = CommandRegistry::new();
        registry
            .register(noop("first").usage("old"))
            .register(noop("second"))
            .register(noop("first").usage("new"));

        assert_eq!(registry.len(), 2);
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(registry.lookup("first").unwrap().usage_text(), "new");
    }
}
