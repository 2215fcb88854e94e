use schemars::{Schema, schema_for};

use certdb_core::entities::{Audit, CertTest, Objective, State};
use certdb_core::records::StateTestRecord;
use certdb_core::responses::{OverviewStats, SearchResponse, StateSummary};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::{SchemaArgs, SchemaType};
use crate::output::output;

fn schema_of(kind: SchemaType) -> Schema {
    match kind {
        SchemaType::StateTestRecord => schema_for!(StateTestRecord),
        SchemaType::State => schema_for!(State),
        SchemaType::Test => schema_for!(CertTest),
        SchemaType::Objective => schema_for!(Objective),
        SchemaType::Audit => schema_for!(Audit),
        SchemaType::StateSummary => schema_for!(StateSummary),
        SchemaType::SearchResponse => schema_for!(SearchResponse),
        SchemaType::Overview => schema_for!(OverviewStats),
    }
}

/// Handle `certdb schema`.
pub fn handle(args: &SchemaArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    output(&schema_of(args.type_name), flags.format)
}
