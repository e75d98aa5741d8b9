#![allow(non_snake_case)]

// Базовые модули
pub mod config;
pub mod consts;
pub mod error;
pub mod lock;
pub mod metrics;

// Хранилище (OLE/CFB и in-memory) + каталог путей
pub mod catalogue;
pub mod storage; // src/storage/{mod,compound,mem}.rs

// Типизированные значения
pub mod codec;
pub mod value;

// Модель метаданных и классификатор массивов
pub mod classify;
pub mod meta; // src/meta/{mod,registry,records}.rs

// Стек изображений (eager/lazy)
pub mod image; // src/image/{mod,paging,pixels,eager,lazy}.rs

// Save engine + сессия
pub mod save; // src/save/{mod,plan,validate,engine}.rs
pub mod session; // src/session/{mod,accessors,save,snapshot}.rs

// Удобные реэкспорты
pub use codec::{Dtype, PixelKind};
pub use config::{AngleUnit, SessionBuilder, TxrmConfig};
pub use error::{LengthViolation, TxrmError};
pub use image::{Frame, LazyStack, PixelStack};
pub use meta::{MetaMap, MotorTable};
pub use save::SaveReport;
pub use session::TxrmFile;
pub use storage::{CfbStorage, MemStorage, OpenMode, Storage};
pub use value::Value;
