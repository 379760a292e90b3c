use std::io::{self, BufRead, Write};

pub trait Prompt {
    /// Ask a yes/no question. `false` means the user declined.
    fn confirm(&mut self, message: &str) -> bool;

    /// Ask for a line of text. `None` means the user cancelled.
    fn input(&mut self, message: &str) -> Option<String>;
}

/// Answers yes to every confirmation and cancels every text request.
pub struct AssumeYes;

impl Prompt for AssumeYes {
    fn confirm(&mut self, message: &str) -> bool {
        log::debug!("Auto-confirmed: {message}");
        true
    }

    fn input(&mut self, _message: &str) -> Option<String> {
        None
    }
}

/// Prompts on stdout and reads answers from stdin.
pub struct Terminal;

impl Terminal {
    fn read_line(message: &str) -> Option<String> {
        print!("{message} ");
        io::stdout().flush().ok();
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

impl Prompt for Terminal {
    fn confirm(&mut self, message: &str) -> bool {
        Self::read_line(&format!("{message} [y/N]"))
            .map(|a| matches!(a.trim().to_lowercase().as_str(), "y" | "yes"))
            .unwrap_or(false)
    }

    fn input(&mut self, message: &str) -> Option<String> {
        Self::read_line(message)
    }
}

/// Ask for a name until a non-blank one is given or the user cancels.
pub fn ask_name(prompt: &mut dyn Prompt, message: &str) -> Option<String> {
    loop {
        let answer = prompt.input(message)?;
        let name = answer.trim();
        if !name.is_empty() {
            return Some(name.to_string());
        }
        log::warn!("Please enter a name");
    }
}

/// Canned answers for tests.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct Scripted {
    pub confirms: std::collections::VecDeque<bool>,
    pub inputs: std::collections::VecDeque<Option<String>>,
    pub asked: Vec<String>,
}

#[cfg(test)]
impl Scripted {
    pub fn confirming(answers: &[bool]) -> Self {
        Self {
            confirms: answers.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn typing(inputs: &[Option<&str>]) -> Self {
        Self {
            inputs: inputs.iter().map(|i| i.map(str::to_string)).collect(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
impl Prompt for Scripted {
    fn confirm(&mut self, message: &str) -> bool {
        self.asked.push(message.to_string());
        self.confirms.pop_front().unwrap_or(false)
    }

    fn input(&mut self, message: &str) -> Option<String> {
        self.asked.push(message.to_string());
        self.inputs.pop_front().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_name_reprompts_on_blank() {
        let mut p = Scripted::typing(&[Some("   "), Some(""), Some(" Horror ")]);
        assert_eq!(ask_name(&mut p, "Enter new list name:"), Some("Horror".into()));
        assert_eq!(p.asked.len(), 3);
    }

    #[test]
    fn test_ask_name_cancel() {
        let mut p = Scripted::typing(&[Some(" "), None]);
        assert_eq!(ask_name(&mut p, "Enter new list name:"), None);
    }

    #[test]
    fn test_assume_yes() {
        assert!(AssumeYes.confirm("Delete?"));
        assert_eq!(AssumeYes.input("Name?"), None);
    }
}
