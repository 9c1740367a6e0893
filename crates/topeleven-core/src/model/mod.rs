//! Entity model: categories, items, references, and the unified list view.

pub mod category;
pub mod entry;
pub mod item;
pub mod list;
pub mod position;
pub mod reference;

pub use category::{MainCategory, SubCategory};
pub use entry::{EntryHandle, ListEntry, ListId};
pub use item::{ItemContent, ItemPatch, Placement, RankItem};
pub use list::{RankedList, SlotMap};
pub use position::{Position, SLOT_COUNT};
pub use reference::Reference;
