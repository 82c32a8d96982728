//! Interactive menu front end.
//!
//! Reads lines from any `BufRead` and writes to any `Write`, so sessions can
//! be scripted in tests. Invalid input, including lines that are not valid
//! UTF-8, is answered with a message and the same question again; it never
//! aborts the program. A failed save at "save and exit" returns to the menu
//! so it can be retried. End of input saves once and ends the run.

use crate::clock::format_stamp;
use crate::membership::validate::{
    compose_full_name, validate_card_number, validate_email, validate_name_part,
    validate_optional_name_part,
};
use crate::membership::{make_membership, Tier, TierChange};
use crate::session::Session;
use crate::SubvaultError;
use std::io::{self, BufRead, ErrorKind, Write};
use tracing::{error, warn};

/// How a console run ended.
#[derive(Debug)]
pub enum Exit {
    /// The ledger was saved.
    Saved,
    /// Input ended and the final save failed; the in-memory ledger was left as is.
    SaveFailed(SubvaultError),
}

/// Menu-driven console bound to a session.
pub struct Console<'a, R, W> {
    session: &'a mut Session,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Console<'a, R, W> {
    /// Bind a console to a session and a pair of streams.
    pub fn new(session: &'a mut Session, input: R, output: W) -> Self {
        Self {
            session,
            input,
            output,
        }
    }

    /// Run the main menu until the user exits or input ends.
    ///
    /// If the streams themselves fail, the ledger is still saved before the
    /// I/O error is returned.
    pub fn run(&mut self) -> io::Result<Exit> {
        let result = match self.greet() {
            Ok(()) => self.main_menu(),
            Err(e) => Err(e),
        };
        match result {
            Ok(exit) => Ok(exit),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                writeln!(self.output)?;
                self.final_save()
            }
            Err(e) => {
                if let Err(save_err) = self.session.save() {
                    error!(error = %save_err, "save after console failure failed");
                }
                Err(e)
            }
        }
    }

    fn greet(&mut self) -> io::Result<()> {
        match self.session.last_saved_at() {
            Some(at) => writeln!(self.output, "Ledger last saved {}.", format_stamp(at)),
            None => writeln!(self.output, "Starting a new ledger."),
        }
    }

    fn main_menu(&mut self) -> io::Result<Exit> {
        loop {
            writeln!(self.output, "\nStreaming Membership System")?;
            writeln!(self.output, "1: Register new client")?;
            writeln!(self.output, "2: List clients")?;
            writeln!(self.output, "3: Manage memberships")?;
            writeln!(self.output, "4: Save and exit")?;

            match self.ask("Choose an option: ")?.as_str() {
                "1" => self.register()?,
                "2" => self.list_active()?,
                "3" => self.administer()?,
                "4" => match self.session.save() {
                    Ok(at) => {
                        writeln!(self.output, "Data saved {}. Goodbye.", format_stamp(at))?;
                        return Ok(Exit::Saved);
                    }
                    Err(e) => {
                        writeln!(self.output, "Could not save data: {}", e)?;
                        writeln!(self.output, "Your changes are still here; try again.")?;
                    }
                },
                _ => writeln!(self.output, "Invalid option. Try again.")?,
            }
        }
    }

    /// Save once more when input has ended.
    fn final_save(&mut self) -> io::Result<Exit> {
        match self.session.save() {
            Ok(at) => {
                writeln!(self.output, "Data saved {}. Goodbye.", format_stamp(at))?;
                Ok(Exit::Saved)
            }
            Err(e) => {
                writeln!(self.output, "Could not save data: {}", e)?;
                Ok(Exit::SaveFailed(e))
            }
        }
    }

    /// Print a prompt and read one trimmed line. End of input is `UnexpectedEof`.
    fn ask(&mut self, prompt: &str) -> io::Result<String> {
        loop {
            write!(self.output, "{}", prompt)?;
            self.output.flush()?;

            let mut line = Vec::new();
            if self.input.read_until(b'\n', &mut line)? == 0 {
                return Err(io::Error::new(ErrorKind::UnexpectedEof, "input closed"));
            }
            match String::from_utf8(line) {
                Ok(line) => return Ok(line.trim_end_matches(['\r', '\n']).to_string()),
                Err(e) => {
                    warn!(error = %e, "discarded non UTF-8 input line");
                    writeln!(self.output, "That input is not valid text. Try again.")?;
                }
            }
        }
    }

    /// Ask until `check` accepts the answer.
    fn ask_until<T>(
        &mut self,
        prompt: &str,
        check: impl Fn(&str) -> Result<T, SubvaultError>,
    ) -> io::Result<T> {
        loop {
            let answer = self.ask(prompt)?;
            match check(&answer) {
                Ok(value) => return Ok(value),
                Err(e) => writeln!(self.output, "{}. Try again.", e)?,
            }
        }
    }

    fn ask_optional_name(&mut self, field: &'static str, prompt: &str) -> io::Result<String> {
        let answer = self.ask(prompt)?;
        match validate_optional_name_part(field, &answer) {
            Ok(value) => Ok(value.unwrap_or_default()),
            Err(e) => {
                writeln!(self.output, "{}. Leaving it blank.", e)?;
                Ok(String::new())
            }
        }
    }

    fn ask_tier(&mut self, prompt: &str) -> io::Result<Tier> {
        for tier in Tier::PAID {
            writeln!(self.output, "{}: {}", tier.id(), tier)?;
        }
        self.ask_until(prompt, |answer| {
            answer
                .trim()
                .parse::<u8>()
                .ok()
                .and_then(Tier::from_target_id)
                .ok_or_else(|| SubvaultError::Validation {
                    field: "membership type",
                    reason: "enter a number from 1 to 4".to_string(),
                })
        })
    }

    /// Ask for a 1-based position in a list of `len` clients; returns the 0-based index.
    fn ask_client(&mut self, len: usize) -> io::Result<usize> {
        self.ask_until("Enter the client number: ", |answer| {
            answer
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=len).contains(n))
                .map(|n| n - 1)
                .ok_or_else(|| SubvaultError::Validation {
                    field: "client number",
                    reason: format!("enter a number from 1 to {}", len),
                })
        })
    }

    fn register(&mut self) -> io::Result<()> {
        let first = self.ask_until("First name: ", |a| validate_name_part("first name", a))?;
        let middle = self.ask_optional_name("middle name", "Middle name (optional): ")?;
        let last = self.ask_until("Last name: ", |a| validate_name_part("last name", a))?;
        let second_last =
            self.ask_optional_name("second last name", "Second last name (optional): ")?;
        let full_name = compose_full_name([
            first.as_str(),
            middle.as_str(),
            last.as_str(),
            second_last.as_str(),
        ]);

        let email = self.ask_until("Email: ", |a| validate_email(a).map(|()| a.to_string()))?;
        let card_number = self.ask_until("Card number (16 digits, no spaces): ", |a| {
            validate_card_number(a).map(|()| a.to_string())
        })?;

        writeln!(self.output, "Membership types:")?;
        let tier = self.ask_tier("Enter the number: ")?;

        let membership = make_membership(tier, email, card_number);
        writeln!(self.output, "\nClient registered.")?;
        writeln!(self.output, "Name: {}", full_name)?;
        writeln!(self.output, "Email: {}", membership.email())?;
        writeln!(self.output, "Membership: {}", membership.tier())?;
        self.session.register_client(full_name, membership);
        Ok(())
    }

    fn list_active(&mut self) -> io::Result<()> {
        let lines = listing(self.session.ledger().active());
        self.print_listing(lines)
    }

    fn print_listing(&mut self, lines: Vec<String>) -> io::Result<()> {
        if lines.is_empty() {
            return writeln!(self.output, "\nNo clients registered.");
        }
        writeln!(self.output, "\nRegistered clients:")?;
        for line in lines {
            writeln!(self.output, "{}", line)?;
        }
        Ok(())
    }

    fn administer(&mut self) -> io::Result<()> {
        if self.session.ledger().is_empty() {
            return writeln!(self.output, "\nNo clients registered yet.");
        }

        loop {
            writeln!(self.output, "\nMembership management:")?;
            writeln!(self.output, "1: Change membership")?;
            writeln!(self.output, "2: Cancel membership")?;
            writeln!(self.output, "3: Reactivate client")?;
            writeln!(self.output, "4: Back to main menu")?;

            match self.ask("Choose an option: ")?.as_str() {
                "1" => self.change_tier()?,
                "2" => self.cancel()?,
                "3" => self.reactivate()?,
                "4" => {
                    writeln!(self.output, "Back to main menu...")?;
                    return Ok(());
                }
                _ => writeln!(self.output, "Invalid option.")?,
            }
        }
    }

    fn change_tier(&mut self) -> io::Result<()> {
        self.list_active()?;
        let len = self.session.ledger().active().len();
        if len == 0 {
            return Ok(());
        }

        let index = self.ask_client(len)?;
        writeln!(self.output, "\nMembership types:")?;
        let target = self.ask_tier("Choose the new membership type: ")?;

        match self.session.change_tier(index, target.id()) {
            Ok(TierChange::Changed(m)) => {
                writeln!(self.output, "\nMembership changed to {}.", m.tier())
            }
            Ok(TierChange::Unchanged(m)) => writeln!(
                self.output,
                "\nCannot change a {} membership to {}.",
                m.tier(),
                target
            ),
            Err(e) => writeln!(self.output, "Error: {}", e),
        }
    }

    fn cancel(&mut self) -> io::Result<()> {
        self.list_active()?;
        let len = self.session.ledger().active().len();
        if len == 0 {
            return Ok(());
        }

        let index = self.ask_client(len)?;
        let name = self.session.ledger().active()[index].full_name.clone();
        match self.session.cancel(index) {
            Ok(()) => writeln!(self.output, "\nMembership cancelled for {}.", name),
            Err(e) => writeln!(self.output, "Error: {}", e),
        }
    }

    fn reactivate(&mut self) -> io::Result<()> {
        let lines = listing(self.session.ledger().inactive());
        self.print_listing(lines)?;
        let len = self.session.ledger().inactive().len();
        if len == 0 {
            return writeln!(self.output, "\nNo inactive clients right now.");
        }

        let index = self.ask_client(len)?;
        writeln!(self.output, "\nMembership types:")?;
        let target = self.ask_tier("Choose the new membership type: ")?;
        let name = self.session.ledger().inactive()[index].full_name.clone();

        match self.session.reactivate(index, target.id()) {
            Ok(()) => writeln!(
                self.output,
                "\nMembership reactivated for {} as {}.",
                name, target
            ),
            Err(e) => writeln!(self.output, "Error: {}", e),
        }
    }
}

/// Numbered `"{n}. {name} - {tier}"` lines, 1-based.
fn listing(clients: &[crate::ledger::Client]) -> Vec<String> {
    clients
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {} - {}", i + 1, c.full_name, c.membership.tier()))
        .collect()
}
