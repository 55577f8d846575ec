use nullbind_common::models::credential::CredentialRecord;
use nullbind_common::models::result::ScanResult;
use nullbind_common::network::target::Target;

/// Collects finished scans in the order they are recorded.
///
/// Purely additive: nothing is merged or deduplicated, and no formatting or
/// persistence happens here.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    results: Vec<ScanResult>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: ScanResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[ScanResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Targets whose full pipeline ran: bind allowed, contexts found, search done.
    pub fn manifest(&self) -> Vec<&Target> {
        self.results
            .iter()
            .filter(|result| result.is_enumerated())
            .map(|result| &result.target)
            .collect()
    }

    /// Records of enumerated targets only, grouped per target.
    pub fn credentials(&self) -> impl Iterator<Item = (&Target, &[CredentialRecord])> {
        self.results
            .iter()
            .filter(|result| result.is_enumerated())
            .map(|result| (&result.target, result.records.as_slice()))
    }

    pub fn allowed_count(&self) -> usize {
        self.results.iter().filter(|result| result.bind_succeeded).count()
    }

    pub fn record_count(&self) -> usize {
        self.results.iter().map(|result| result.records.len()).sum()
    }
}
