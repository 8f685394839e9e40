//! Line-oriented session loop over a [`SearchService`]
use crate::error::{AccessError, KaraokeError, Result};
use crate::output::{OutputFormat, OutputFormatter};
use crate::policy::AccessState;
use crate::service::SearchService;
use crate::session::SessionState;
use colored::*;
use dialoguer::{Confirm, Password};
use log::info;
use std::io::{BufRead, Write};

/// Source of answers the loop needs from the user outside the command line.
pub trait Prompter {
    fn secret(&mut self, identity: &str) -> Result<String>;

    /// Stand-in for "watch an ad": `true` grants one reward block.
    fn confirm_reward(&mut self, reward: u32) -> Result<bool>;
}

/// Prompts on the controlling terminal.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn secret(&mut self, identity: &str) -> Result<String> {
        Ok(Password::new()
            .with_prompt(format!("Password for {identity}"))
            .allow_empty_password(true)
            .interact()?)
    }

    fn confirm_reward(&mut self, reward: u32) -> Result<bool> {
        println!("{}", "[sponsored] Thanks for supporting the catalog!".dimmed());
        Ok(Confirm::new()
            .with_prompt(format!("Finished watching? (+{reward} searches)"))
            .default(false)
            .interact()?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Query(String),
    Login {
        identity: String,
        secret: Option<String>,
    },
    Logout,
    Unlock,
    Embed(String),
    List,
    Status,
    Help,
    Quit,
    Unknown(String),
}

/// Lines starting with `:` are commands; anything else is a query.
pub fn parse_command(line: &str) -> SessionCommand {
    let line = line.trim();
    let Some(rest) = line.strip_prefix(':') else {
        return SessionCommand::Query(line.to_string());
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    match name {
        "login" => match parts.next() {
            Some(identity) => SessionCommand::Login {
                identity: identity.to_string(),
                secret: parts.next().map(str::to_string),
            },
            None => SessionCommand::Unknown(line.to_string()),
        },
        "logout" => SessionCommand::Logout,
        "unlock" => SessionCommand::Unlock,
        "embed" => match parts.next() {
            Some(key) => SessionCommand::Embed(key.to_string()),
            None => SessionCommand::Unknown(line.to_string()),
        },
        "list" => SessionCommand::List,
        "status" => SessionCommand::Status,
        "help" | "h" => SessionCommand::Help,
        "quit" | "q" | "exit" => SessionCommand::Quit,
        _ => SessionCommand::Unknown(line.to_string()),
    }
}

/// Interactive search session
pub struct InteractiveSession<'a, P: Prompter> {
    service: &'a SearchService,
    session: SessionState,
    prompter: P,
    formatter: OutputFormatter,
    preview_limit: usize,
    signup_url: Option<String>,
}

impl<'a, P: Prompter> InteractiveSession<'a, P> {
    pub fn new(service: &'a SearchService, prompter: P) -> Self {
        Self {
            service,
            session: service.new_session(),
            prompter,
            formatter: OutputFormatter::new(OutputFormat::Table),
            preview_limit: 50,
            signup_url: None,
        }
    }

    pub fn preview_limit(mut self, limit: usize) -> Self {
        self.preview_limit = limit;
        self
    }

    pub fn signup_url(mut self, url: Option<String>) -> Self {
        self.signup_url = url;
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.formatter = OutputFormatter::new(format);
        self
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Read commands from `input` until it ends or `:quit` is given.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<()> {
        info!("Starting interactive session");
        writeln!(out, "{}", "Type a keyword to search, :help for commands".dimmed())?;
        self.write_status(out)?;

        for line in input.lines() {
            let line = line?;
            if !self.handle(parse_command(&line), out)? {
                break;
            }
        }

        info!("Interactive session finished");
        Ok(())
    }

    /// Apply one command; returns `false` once the session should end.
    pub fn handle<W: Write>(&mut self, command: SessionCommand, out: &mut W) -> Result<bool> {
        let result = match command {
            SessionCommand::Quit => return Ok(false),
            SessionCommand::Query(query) if query.is_empty() => Ok(()),
            SessionCommand::Query(query) => self.query(&query, out),
            SessionCommand::Login { identity, secret } => self.login(&identity, secret, out),
            SessionCommand::Logout => {
                self.session = self.service.logout(&self.session);
                writeln!(out, "Logged out")?;
                Ok(())
            }
            SessionCommand::Unlock => self.unlock(out),
            SessionCommand::Embed(key) => self
                .service
                .authorize_embed(&self.session, &key)
                .map(|next| {
                    self.session = next;
                }),
            SessionCommand::List => self.list(out),
            SessionCommand::Status => self.write_status(out),
            SessionCommand::Help => write_help(out),
            SessionCommand::Unknown(line) => {
                writeln!(out, "{} {}", "Unknown command:".red(), line)?;
                Ok(())
            }
        };

        match result {
            Ok(()) => Ok(true),
            Err(KaraokeError::Io(e)) => Err(KaraokeError::Io(e)),
            Err(e) => {
                self.report(&e, out)?;
                Ok(true)
            }
        }
    }

    fn query<W: Write>(&mut self, query: &str, out: &mut W) -> Result<()> {
        let outcome = self.service.submit_query(&self.session, query)?;
        self.session = outcome.session;
        write!(out, "{}", self.formatter.format_results(&outcome.matches, Some(query))?)?;
        if let Some(remaining) = self.service.remaining_quota(&self.session) {
            writeln!(out, "{}", format!("{remaining} free searches left").dimmed())?;
        }
        Ok(())
    }

    fn login<W: Write>(&mut self, identity: &str, secret: Option<String>, out: &mut W) -> Result<()> {
        let secret = match secret {
            Some(secret) => secret,
            None => self.prompter.secret(identity)?,
        };
        self.session = self.service.login(&self.session, identity, &secret)?;
        writeln!(out, "{} {}", "Logged in as".green(), identity)?;
        Ok(())
    }

    fn unlock<W: Write>(&mut self, out: &mut W) -> Result<()> {
        if self.service.remaining_quota(&self.session).is_none() {
            writeln!(out, "No search quota applies in this session")?;
            return Ok(());
        }
        let reward = self.service.policy().quota().reward_limit;
        if self.prompter.confirm_reward(reward)? {
            self.session = self.service.claim_reward(&self.session);
            writeln!(
                out,
                "{} {} more searches",
                "Unlocked".green(),
                reward
            )?;
        } else {
            writeln!(out, "Unlock cancelled")?;
        }
        Ok(())
    }

    fn list<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let rows = self.service.preview(&self.session, self.preview_limit)?;
        write!(out, "{}", self.formatter.format_results(&rows, None)?)?;
        Ok(())
    }

    fn write_status<W: Write>(&self, out: &mut W) -> Result<()> {
        let state = match self.service.state(&self.session) {
            AccessState::LoggedIn => format!("logged in as {}", self.session.identity()),
            AccessState::LoggedOut => "logged out".to_string(),
            AccessState::GuestWithQuota | AccessState::GuestExhausted => format!(
                "guest, {}/{} searches used",
                self.session.search_count(),
                self.session.search_limit()
            ),
        };
        writeln!(out, "{} {}", "Status:".cyan(), state)?;
        Ok(())
    }

    fn report<W: Write>(&self, error: &KaraokeError, out: &mut W) -> Result<()> {
        writeln!(out, "{}", error.to_string().red())?;
        match error {
            KaraokeError::Access(AccessError::QuotaExceeded { .. }) => {
                let reward = self.service.policy().quota().reward_limit;
                writeln!(out, "Type :unlock to get {reward} more searches")?;
            }
            KaraokeError::Access(AccessError::LoginRequired) => {
                writeln!(out, "Use :login <id> to sign in")?;
                if let Some(url) = &self.signup_url {
                    writeln!(out, "No account yet? Sign up at {url}")?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

fn write_help<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "{}", "Commands:".green().bold())?;
    writeln!(out, "  <keyword>          search performers and titles")?;
    writeln!(out, "  :login <id> [pw]   sign in")?;
    writeln!(out, "  :logout            sign out")?;
    writeln!(out, "  :embed <key>       unlock with an embed key")?;
    writeln!(out, "  :unlock            get more free searches")?;
    writeln!(out, "  :list              show the first rows of the catalog")?;
    writeln!(out, "  :status            show login and quota state")?;
    writeln!(out, "  :quit              leave")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_query() {
        assert_eq!(
            parse_command("  マリーゴールド "),
            SessionCommand::Query("マリーゴールド".to_string())
        );
    }

    #[test]
    fn test_parse_login_with_and_without_secret() {
        assert_eq!(
            parse_command(":login alice pw1"),
            SessionCommand::Login {
                identity: "alice".to_string(),
                secret: Some("pw1".to_string())
            }
        );
        assert_eq!(
            parse_command(":login alice"),
            SessionCommand::Login {
                identity: "alice".to_string(),
                secret: None
            }
        );
        assert!(matches!(parse_command(":login"), SessionCommand::Unknown(_)));
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command(":unlock"), SessionCommand::Unlock);
        assert_eq!(parse_command(":q"), SessionCommand::Quit);
        assert_eq!(
            parse_command(":embed abc"),
            SessionCommand::Embed("abc".to_string())
        );
        assert!(matches!(parse_command(":dance"), SessionCommand::Unknown(_)));
    }
}
