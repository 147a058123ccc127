use std::io::{self, BufRead};
use std::thread;

use storefront_core::{ProductId, StoreEvent};
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver};

pub const HELP: &str = "\
Commands:
  filter <text>   show products whose name contains <text> (empty clears)
  name <text>     set the new product's name
  price <text>    set the new product's price
  submit          create the new product
  add <id>        add a product to the cart
  remove <id>     remove a product from the cart
  show            redraw the store
  help            show this help
  quit            leave the store";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Store(StoreEvent),
    Show,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("unknown command `{0}`; type `help` for the list")]
    Unknown(String),
    #[error("`{0}` needs a product id")]
    MissingProductId(&'static str),
}

/// Reads lines on a plain thread and forwards them to the session loop.
///
/// Blocking reads are never handed to the runtime, so shutdown does not wait
/// on a pending read. The channel closes at end of input or on the first read
/// error, which is forwarded.
pub fn spawn_line_reader<R>(reader: R) -> UnboundedReceiver<io::Result<String>>
where
    R: BufRead + Send + 'static,
{
    let (lines_tx, lines_rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        for line in reader.lines() {
            let failed = line.is_err();
            if lines_tx.send(line).is_err() || failed {
                break;
            }
        }
    });
    lines_rx
}

/// Parses one input line. The verb is case-insensitive. Arguments are trimmed,
/// except the filter text which keeps everything after the single separator.
pub fn parse_command(input: &str) -> Result<Command, CommandParseError> {
    let input = input.trim_end_matches(['\r', '\n']);
    let trimmed = input.trim_start();
    if trimmed.trim_end().is_empty() {
        return Ok(Command::Show);
    }

    let (verb, raw_argument) = match trimmed.find(char::is_whitespace) {
        Some(split) => {
            let (verb, rest) = trimmed.split_at(split);
            let separator = rest.chars().next().map_or(0, char::len_utf8);
            (verb, &rest[separator..])
        }
        None => (trimmed, ""),
    };
    let argument = raw_argument.trim();

    let command = match verb.to_ascii_lowercase().as_str() {
        "filter" | "search" => {
            Command::Store(StoreEvent::FilterChanged(raw_argument.to_owned()))
        }
        "name" => Command::Store(StoreEvent::DraftNameChanged(argument.to_owned())),
        "price" => Command::Store(StoreEvent::DraftPriceChanged(argument.to_owned())),
        "submit" => Command::Store(StoreEvent::DraftSubmitted),
        "add" => Command::Store(StoreEvent::AddToCart(product_id("add", argument)?)),
        "remove" | "rm" => {
            Command::Store(StoreEvent::RemoveFromCart(product_id("remove", argument)?))
        }
        "show" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandParseError::Unknown(other.to_owned())),
    };
    Ok(command)
}

fn product_id(verb: &'static str, argument: &str) -> Result<ProductId, CommandParseError> {
    if argument.is_empty() {
        return Err(CommandParseError::MissingProductId(verb));
    }
    Ok(ProductId::from(argument))
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor, Read};

    use storefront_core::{ProductId, StoreEvent};

    use crate::input::{parse_command, spawn_line_reader, Command, CommandParseError};

    #[test]
    fn store_commands_map_to_events() {
        assert_eq!(
            parse_command("filter ap"),
            Ok(Command::Store(StoreEvent::FilterChanged("ap".to_owned())))
        );
        assert_eq!(
            parse_command("  NAME  Green apple "),
            Ok(Command::Store(StoreEvent::DraftNameChanged("Green apple".to_owned())))
        );
        assert_eq!(
            parse_command("price 2.00"),
            Ok(Command::Store(StoreEvent::DraftPriceChanged("2.00".to_owned())))
        );
        assert_eq!(parse_command("submit"), Ok(Command::Store(StoreEvent::DraftSubmitted)));
        assert_eq!(
            parse_command("add 1"),
            Ok(Command::Store(StoreEvent::AddToCart(ProductId::from("1"))))
        );
        assert_eq!(
            parse_command("remove 1"),
            Ok(Command::Store(StoreEvent::RemoveFromCart(ProductId::from("1"))))
        );
    }

    #[test]
    fn filter_keeps_surrounding_spaces_of_its_text() {
        assert_eq!(
            parse_command("filter pen "),
            Ok(Command::Store(StoreEvent::FilterChanged("pen ".to_owned())))
        );
        assert_eq!(
            parse_command("search  ink\n"),
            Ok(Command::Store(StoreEvent::FilterChanged(" ink".to_owned())))
        );
    }

    #[test]
    fn bare_filter_clears_and_blank_line_redraws() {
        assert_eq!(
            parse_command("filter"),
            Ok(Command::Store(StoreEvent::FilterChanged(String::new())))
        );
        assert_eq!(parse_command("   "), Ok(Command::Show));
        assert_eq!(parse_command("quit"), Ok(Command::Quit));
        assert_eq!(parse_command("help"), Ok(Command::Help));
    }

    #[test]
    fn cart_commands_require_an_id() {
        assert_eq!(parse_command("add"), Err(CommandParseError::MissingProductId("add")));
        assert_eq!(
            parse_command("remove   "),
            Err(CommandParseError::MissingProductId("remove"))
        );
    }

    #[test]
    fn unknown_verb_is_reported() {
        let error = parse_command("checkout now").expect_err("unknown verb");

        assert_eq!(error, CommandParseError::Unknown("checkout".to_owned()));
        assert!(error.to_string().contains("help"));
    }

    #[tokio::test]
    async fn line_reader_forwards_lines_then_closes() {
        let mut lines = spawn_line_reader(Cursor::new("add 1\nquit\n"));

        assert_eq!(lines.recv().await.map(Result::ok), Some(Some("add 1".to_owned())));
        assert_eq!(lines.recv().await.map(Result::ok), Some(Some("quit".to_owned())));
        assert!(lines.recv().await.is_none());
    }

    struct BrokenInput;

    impl Read for BrokenInput {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal went away"))
        }
    }

    #[tokio::test]
    async fn line_reader_forwards_a_read_error_and_stops() {
        let mut lines = spawn_line_reader(io::BufReader::new(BrokenInput));

        let error = lines.recv().await.expect("error forwarded").expect_err("read error");
        assert_eq!(error.kind(), io::ErrorKind::BrokenPipe);
        assert!(lines.recv().await.is_none());
    }
}
