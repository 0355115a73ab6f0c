//! epes-rv (Record Review) - command line access to stored servicing records
//!
//! Lists, shows, exports and imports the records kept in `epes.db`, and
//! writes pre-filled templates for new records.

pub mod commands;
