pub mod final_record;

pub use final_record::Entity as FinalRecord;
