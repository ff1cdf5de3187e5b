use class_market::{Route, progress::LessonRef};
use std::{fmt, path::PathBuf};

/// A line of user input, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    /// Navigate to a route.
    Go(Route),
    /// Refetch the current page.
    Refresh,
    /// Filter the catalog by class name.
    Search(String),
    Login {
        email: String,
        password: String,
    },
    Register {
        email: String,
        password: String,
        name: String,
    },
    /// Sign in with a Google ID token.
    Google(String),
    Logout,
    WhoAmI,
    /// Put a class in the cart.
    Select(String),
    /// Remove a cart item (asks for confirmation).
    Remove(String),
    Pay {
        number: String,
        exp_month: u8,
        exp_year: u16,
        cvc: String,
    },
    /// Toggle a lesson in the open course, zero-based.
    Done(LessonRef),
    Apply {
        title: String,
        experience: String,
    },
    /// Submit a new class described by a JSON file.
    Publish(PathBuf),
    Edit {
        class_id: String,
        file: PathBuf,
    },
    /// Delete one of the instructor's classes (asks for confirmation).
    Delete(String),
    Approve(String),
    Reject {
        class_id: String,
        feedback: Option<String>,
    },
    MakeAdmin(String),
    MakeInstructor(String),
    /// Approve an instructor application.
    Accept(String),
    /// Reject an instructor application.
    Decline(String),
    Profile {
        name: String,
        photo: Option<PathBuf>,
    },
    Yes,
    No,
}

/// Errors that can occur during command parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Required argument missing; carries the usage line.
    MissingArgument(&'static str),
    /// Argument is not a valid number.
    InvalidNumber { what: &'static str, value: String },
    /// Card expiry not in MM/YY or MM/YYYY form.
    InvalidExpiry(String),
    /// Unrecognized command.
    UnrecognizedCommand(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingArgument(usage) => write!(f, "Missing argument. Usage: {}", usage),
            Self::InvalidNumber { what, value } => {
                write!(f, "Invalid {} '{}'. Must be a positive whole number", what, value)
            }
            Self::InvalidExpiry(value) => {
                write!(f, "Invalid expiry '{}'. Use MM/YY (e.g., 'pay 4242424242424242 12/30 123')", value)
            }
            Self::UnrecognizedCommand(cmd) => write!(
                f,
                "Unrecognized command '{}'. Type 'help' to see available commands",
                cmd
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse a command string into a [`Command`].
///
/// # Examples
///
/// ```
/// use cm_client::commands::{Command, parse_command};
/// use class_market::Route;
///
/// assert_eq!(parse_command("logout"), Ok(Command::Logout));
/// assert_eq!(parse_command("go /classes"), Ok(Command::Go(Route::Classes)));
/// assert_eq!(parse_command("done 1 2"), Ok(Command::Done((0, 1))));
/// ```
pub fn parse_command(input: &str) -> Result<Command, ParseError> {
    let trimmed = input.trim();

    // Try single-word commands first
    match trimmed.to_lowercase().as_str() {
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" => return Ok(Command::Quit),
        "refresh" | "r" => return Ok(Command::Refresh),
        "logout" => return Ok(Command::Logout),
        "whoami" => return Ok(Command::WhoAmI),
        "yes" | "y" => return Ok(Command::Yes),
        "no" | "n" => return Ok(Command::No),
        "home" => return Ok(Command::Go(Route::Home)),
        "classes" => return Ok(Command::Go(Route::Classes)),
        "instructors" => return Ok(Command::Go(Route::Instructors)),
        "dashboard" => return Ok(Command::Go(Route::Dashboard)),
        "cart" => return Ok(Command::Go(Route::SelectedClasses)),
        "checkout" => return Ok(Command::Go(Route::Checkout)),
        _ => {}
    }

    let (head, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (trimmed, ""),
    };
    let parts: Vec<&str> = rest.split_ascii_whitespace().collect();

    match head.to_lowercase().as_str() {
        "go" | "open" => {
            let path = one(&parts, "go <path>")?;
            Ok(Command::Go(Route::parse(path)))
        }
        "class" => Ok(Command::Go(Route::ClassDetail(one(&parts, "class <class id>")?.to_string()))),
        "learn" => Ok(Command::Go(Route::CoursePlayer(one(&parts, "learn <class id>")?.to_string()))),
        "search" => Ok(Command::Search(rest.to_string())),
        "login" => match parts.as_slice() {
            [email, password] => Ok(Command::Login {
                email: email.to_string(),
                password: password.to_string(),
            }),
            _ => Err(ParseError::MissingArgument("login <email> <password>")),
        },
        "register" => match parts.as_slice() {
            [email, password, name @ ..] if !name.is_empty() => Ok(Command::Register {
                email: email.to_string(),
                password: password.to_string(),
                name: name.join(" "),
            }),
            _ => Err(ParseError::MissingArgument("register <email> <password> <name>")),
        },
        "google" => Ok(Command::Google(one(&parts, "google <id token>")?.to_string())),
        "select" => Ok(Command::Select(one(&parts, "select <class id>")?.to_string())),
        "remove" => Ok(Command::Remove(one(&parts, "remove <cart item id>")?.to_string())),
        "pay" => parse_pay_command(&parts),
        "done" => parse_done_command(&parts),
        "apply" => {
            let (title, experience) = split_pair(rest).ok_or(ParseError::MissingArgument(
                "apply <title> | <experience>",
            ))?;
            Ok(Command::Apply { title, experience })
        }
        "publish" => Ok(Command::Publish(PathBuf::from(one(&parts, "publish <class.json>")?))),
        "edit" => match parts.as_slice() {
            [class_id, file] => Ok(Command::Edit {
                class_id: class_id.to_string(),
                file: PathBuf::from(file),
            }),
            _ => Err(ParseError::MissingArgument("edit <class id> <class.json>")),
        },
        "delete" => Ok(Command::Delete(one(&parts, "delete <class id>")?.to_string())),
        "approve" => Ok(Command::Approve(one(&parts, "approve <class id>")?.to_string())),
        "reject" => match parts.as_slice() {
            [class_id, feedback @ ..] => Ok(Command::Reject {
                class_id: class_id.to_string(),
                feedback: (!feedback.is_empty()).then(|| feedback.join(" ")),
            }),
            [] => Err(ParseError::MissingArgument("reject <class id> [feedback]")),
        },
        "make-admin" => Ok(Command::MakeAdmin(one(&parts, "make-admin <user id>")?.to_string())),
        "make-instructor" => Ok(Command::MakeInstructor(
            one(&parts, "make-instructor <user id>")?.to_string(),
        )),
        "accept" => Ok(Command::Accept(one(&parts, "accept <application id>")?.to_string())),
        "decline" => Ok(Command::Decline(one(&parts, "decline <application id>")?.to_string())),
        "profile" => {
            if rest.is_empty() {
                return Err(ParseError::MissingArgument("profile <name> [| <photo path>]"));
            }
            let (name, photo) = match split_pair(rest) {
                Some((name, photo)) => (name, Some(PathBuf::from(photo))),
                None => (rest.to_string(), None),
            };
            Ok(Command::Profile { name, photo })
        }
        _ => Err(ParseError::UnrecognizedCommand(trimmed.to_string())),
    }
}

/// Exactly one argument.
fn one<'a>(parts: &[&'a str], usage: &'static str) -> Result<&'a str, ParseError> {
    match parts {
        [value] => Ok(*value),
        _ => Err(ParseError::MissingArgument(usage)),
    }
}

/// "left | right" with both sides non-empty.
fn split_pair(text: &str) -> Option<(String, String)> {
    let (left, right) = text.split_once('|')?;
    let (left, right) = (left.trim(), right.trim());
    (!left.is_empty() && !right.is_empty()).then(|| (left.to_string(), right.to_string()))
}

/// Parse a pay command: "pay NUMBER MM/YY CVC". The number may be split in groups.
fn parse_pay_command(parts: &[&str]) -> Result<Command, ParseError> {
    const USAGE: &str = "pay <card number> <MM/YY> <cvc>";
    let [number @ .., expiry, cvc] = parts else {
        return Err(ParseError::MissingArgument(USAGE));
    };
    if number.is_empty() {
        return Err(ParseError::MissingArgument(USAGE));
    }

    let (month, year) = expiry
        .split_once('/')
        .ok_or_else(|| ParseError::InvalidExpiry(expiry.to_string()))?;
    let exp_month: u8 = month
        .parse()
        .ok()
        .filter(|m| (1..=12).contains(m))
        .ok_or_else(|| ParseError::InvalidExpiry(expiry.to_string()))?;
    let exp_year: u16 = match (year.len(), year.parse::<u16>()) {
        (2, Ok(yy)) => 2000 + yy,
        (4, Ok(yyyy)) => yyyy,
        _ => return Err(ParseError::InvalidExpiry(expiry.to_string())),
    };

    Ok(Command::Pay {
        number: number.concat(),
        exp_month,
        exp_year,
        cvc: cvc.to_string(),
    })
}

/// Parse a done command: "done MODULE LESSON", both one-based.
fn parse_done_command(parts: &[&str]) -> Result<Command, ParseError> {
    let [module, lesson] = parts else {
        return Err(ParseError::MissingArgument("done <module> <lesson>"));
    };
    let index = |what: &'static str, value: &str| {
        value
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .map(|n| n - 1)
            .ok_or_else(|| ParseError::InvalidNumber {
                what,
                value: value.to_string(),
            })
    };
    Ok(Command::Done((index("module", *module)?, index("lesson", *lesson)?)))
}
