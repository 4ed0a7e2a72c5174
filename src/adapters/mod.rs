//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter    | Implements              | Connects to                 |
//! |------------|-------------------------|-----------------------------|
//! | `sim`      | QueryPort, CommandPort  | In-memory simulated brewer  |
//! | `log_sink` | CommandPort (decorator) | `log` output + inner port   |

pub mod log_sink;
pub mod sim;
