use crate::errors::AppError;
use crate::models::LookupResult;

/// Fan-in of per-entity outcomes.
///
/// One slot per input entity. The first error wins; once an error is
/// recorded every later outcome is ignored.
#[derive(Debug)]
pub struct ResultAggregator {
    slots: Vec<Option<LookupResult>>,
    error: Option<AppError>,
}

impl ResultAggregator {
    pub fn new(expected: usize) -> Self {
        Self {
            slots: vec![None; expected],
            error: None,
        }
    }

    /// Records the outcome for the entity at `index`.
    ///
    /// Returns the batch error when this (or an earlier) outcome failed, so
    /// the caller can stop waiting on the rest.
    pub fn accept(
        &mut self,
        index: usize,
        outcome: Result<LookupResult, AppError>,
    ) -> Result<(), AppError> {
        if let Some(ref error) = self.error {
            return Err(error.clone());
        }

        match outcome {
            Ok(result) => match self.slots.get_mut(index) {
                Some(slot) => {
                    *slot = Some(result);
                    Ok(())
                }
                None => {
                    let error =
                        AppError::InternalError(format!("lookup index {} out of range", index));
                    self.error = Some(error.clone());
                    Err(error)
                }
            },
            Err(error) => {
                self.error = Some(error.clone());
                Err(error)
            }
        }
    }

    /// Final outcome: every result in input order, or the first error.
    pub fn finish(self) -> Result<Vec<LookupResult>, AppError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let expected = self.slots.len();
        let results: Vec<LookupResult> = self.slots.into_iter().flatten().collect();
        if results.len() != expected {
            return Err(AppError::InternalError(format!(
                "expected {} lookup results, got {}",
                expected,
                results.len()
            )));
        }

        Ok(results)
    }
}
