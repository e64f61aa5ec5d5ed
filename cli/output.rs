use darty_core::{IndentLevel, Output};

/// Prints every message to stdout, marking successes green and failures red.
#[derive(Debug)]
pub struct ConsoleOutput {
    level: IndentLevel,
    term: console::Term,
}

impl ConsoleOutput {
    pub fn new() -> Self {
        Self {
            level: IndentLevel::default(),
            term: console::Term::stdout(),
        }
    }

    fn style(message: &str) -> String {
        let green_bold = console::Style::new().green().bold();
        let red_bold = console::Style::new().red().bold();

        if let Some(rest) = message.strip_prefix("[+]") {
            format!("{}{}", green_bold.apply_to("[+]"), rest)
        } else if let Some(rest) = message.strip_prefix("[-]") {
            format!("{}{}", red_bold.apply_to("[-]"), rest)
        } else {
            message.to_string()
        }
    }
}

impl Output for ConsoleOutput {
    fn write(&self, message: &str) {
        let _ = self.term.write_line(&self.level.apply(&Self::style(message)));
    }

    fn increase_indent(&self) {
        self.level.increase();
    }

    fn decrease_indent(&self) {
        self.level.decrease();
    }
}
