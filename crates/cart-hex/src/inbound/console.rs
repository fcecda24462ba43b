use std::fmt::Write as _;
use std::sync::Arc;

use cart_types::domain::cart::{CartItem, RemoveOutcome};
use cart_types::domain::money::Money;
use cart_types::domain::order::RestaurantRef;
use cart_types::ports::order_gateway::OrderGateway;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::application::cart_store::CartStore;
use crate::application::checkout_service::CheckoutService;
use crate::errors::AppError;

const HELP: &str = "\
commands:
  add <id> <price> <name...>                        add one unit of a dish
  remove <id>                                       remove one unit of a dish
  qty <id>                                          units of a dish in the cart
  show                                              list the cart
  quote                                             subtotal, delivery fee and total
  checkout <user> <restaurant-id> <restaurant...>   place the order
  abandon                                           drop the cart without ordering
  clear                                             empty the cart
  help
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(CartItem),
    Remove(String),
    Quantity(String),
    Show,
    Quote,
    Checkout {
        user_id: String,
        restaurant: RestaurantRef,
    },
    Abandon,
    Clear,
    Help,
    Quit,
}

impl Command {
    /// Parses one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, AppError> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let cmd = match verb.to_ascii_lowercase().as_str() {
            "add" => {
                let id = required(words.next(), "add: missing dish id")?;
                let price: Money = required(words.next(), "add: missing price")?.parse()?;
                let name = rest(words);
                if name.is_empty() {
                    return Err(AppError::BadRequest("add: missing dish name".into()));
                }
                Command::Add(CartItem::new(id, name, price))
            }
            "remove" | "rm" => Command::Remove(required(words.next(), "remove: missing dish id")?),
            "qty" => Command::Quantity(required(words.next(), "qty: missing dish id")?),
            "show" | "ls" => Command::Show,
            "quote" => Command::Quote,
            "checkout" => {
                let user_id = required(words.next(), "checkout: missing user")?;
                let id = required(words.next(), "checkout: missing restaurant id")?;
                let name = rest(words);
                let name = if name.is_empty() { id.clone() } else { name };
                Command::Checkout {
                    user_id,
                    restaurant: RestaurantRef { id, name },
                }
            }
            "abandon" => Command::Abandon,
            "clear" => Command::Clear,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(AppError::BadRequest(format!("unknown command {other:?}"))),
        };
        Ok(Some(cmd))
    }
}

fn required(word: Option<&str>, msg: &str) -> Result<String, AppError> {
    word.map(str::to_string)
        .ok_or_else(|| AppError::BadRequest(msg.into()))
}

fn rest<'a>(words: impl Iterator<Item = &'a str>) -> String {
    words.collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Reply(String),
    Quit,
}

/// Drives a cart session from text commands.
pub struct Console<G: OrderGateway> {
    store: Arc<CartStore>,
    checkout: CheckoutService<G>,
}

impl<G: OrderGateway> Console<G> {
    pub fn new(store: Arc<CartStore>, checkout: CheckoutService<G>) -> Self {
        Self { store, checkout }
    }

    pub async fn execute(&self, cmd: Command) -> Result<Step, AppError> {
        let reply = match cmd {
            Command::Add(item) => {
                let name = item.name.clone();
                let qty = self.store.add_item(item)?;
                format!("{qty} x {name} in cart")
            }
            Command::Remove(id) => match self.store.remove_one_unit(&id) {
                RemoveOutcome::Removed(item) => format!(
                    "removed one {}, {} left",
                    item.name,
                    self.store.quantity_of(&id)
                ),
                RemoveOutcome::NotFound => format!("{id} is not in the cart"),
            },
            Command::Quantity(id) => format!("{id}: {}", self.store.quantity_of(&id)),
            Command::Show => self.render_cart(),
            Command::Quote => {
                let q = self.checkout.quote();
                format!(
                    "subtotal ${}\ndelivery fee ${}\norder total ${}",
                    q.subtotal, q.delivery_fee, q.total
                )
            }
            Command::Checkout {
                user_id,
                restaurant,
            } => {
                let placed = self.checkout.place_order(user_id, &restaurant).await?;
                format!(
                    "order #{} placed with {}, estimated delivery {}",
                    placed.id,
                    restaurant.name,
                    placed.estimated_delivery_time.format("%H:%M UTC")
                )
            }
            Command::Abandon => {
                self.checkout.abandon();
                "cart abandoned".into()
            }
            Command::Clear => {
                self.store.clear();
                "cart cleared".into()
            }
            Command::Help => HELP.into(),
            Command::Quit => return Ok(Step::Quit),
        };
        Ok(Step::Reply(reply))
    }

    fn render_cart(&self) -> String {
        let groups = self.store.grouped_view();
        if groups.is_empty() {
            return "cart is empty".into();
        }
        let mut out = String::new();
        for group in &groups {
            if let Some(unit) = group.unit() {
                let _ = writeln!(
                    out,
                    "{} x {} ({}) @ ${} = ${}",
                    group.quantity(),
                    unit.name,
                    group.id,
                    unit.price,
                    group.line_total()
                );
            }
        }
        let _ = write!(out, "subtotal ${}", self.store.subtotal());
        out
    }

    /// Reads commands line by line until `quit` or end of input.
    pub async fn run<R, W>(&self, input: R, mut output: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            let step = match Command::parse(&line) {
                Ok(None) => continue,
                Ok(Some(cmd)) => self.execute(cmd).await,
                Err(e) => Err(e),
            };
            let text = match step {
                Ok(Step::Reply(text)) => text,
                Ok(Step::Quit) => break,
                Err(e) => {
                    if let AppError::Internal(inner) = &e {
                        tracing::error!(error = ?inner, "command failed");
                    }
                    format!("error: {}", e.user_message())
                }
            };
            output.write_all(text.as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_add_with_multiword_name() {
        let cmd = Command::parse("add D1 8.50 Margherita Pizza").unwrap().unwrap();
        assert_eq!(
            cmd,
            Command::Add(CartItem::new("D1", "Margherita Pizza", Money::from_cents(850)))
        );
    }

    #[test]
    fn parses_checkout() {
        let cmd = Command::parse("checkout u-1 R9 Sushi Place").unwrap().unwrap();
        assert_eq!(
            cmd,
            Command::Checkout {
                user_id: "u-1".into(),
                restaurant: RestaurantRef {
                    id: "R9".into(),
                    name: "Sushi Place".into()
                },
            }
        );
    }

    #[test]
    fn parse_errors() {
        assert!(Command::parse("   ").unwrap().is_none());
        assert!(matches!(Command::parse("add D1"), Err(AppError::BadRequest(_))));
        assert!(matches!(Command::parse("add D1 abc Pizza"), Err(AppError::BadRequest(_))));
        assert!(matches!(Command::parse("add D1 1.00"), Err(AppError::BadRequest(_))));
        assert!(matches!(Command::parse("dance"), Err(AppError::BadRequest(_))));
    }
}
