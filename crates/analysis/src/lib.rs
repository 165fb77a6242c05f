pub mod classify;
pub mod ratios;
pub mod reclass;
pub mod report;

pub use classify::{ClassifiedRow, ClassifiedStatement};
pub use ratios::{Kpis, ValueAdded};
pub use reclass::{Bucket, Reclassified};
pub use report::{build_report, Report, ReportGroup, ReportRow, ReportValue};

use serde::Serialize;

use bilancio_core::Statement;
use bilancio_import::Classifier;

/// The full analysis of one statement: classified rows, the reclassified
/// balance-sheet view, the value-added income view, and the ratio set.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub classified: ClassifiedStatement,
    pub reclassified: Reclassified,
    pub value_added: ValueAdded,
    pub kpis: Kpis,
}

pub fn analyze(statement: &Statement, classifier: &Classifier) -> Analysis {
    let classified = classify::classify(statement, classifier);
    let reclassified = Reclassified::from_classified(&classified);
    let value_added = ValueAdded::from_classified(&classified);
    let kpis = Kpis::compute(&classified, &reclassified, &value_added);
    Analysis {
        classified,
        reclassified,
        value_added,
        kpis,
    }
}
