pub mod account;
pub mod directory;
pub mod inventory;
pub mod listing;
pub mod pricing;
pub mod ticket_type;

pub use account::{UserInput, UserService};
pub use directory::InMemoryDirectory;
pub use inventory::InventoryManager;
pub use listing::{EventInput, EventService, LocationInput, ScheduleInput};
pub use pricing::{LineRequest, PricedLine, PricingEngine, Quote};
pub use ticket_type::{CreateTicketType, TicketTypeService, UpdateTicketType};
