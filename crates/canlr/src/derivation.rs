//! Reconstruction of the rightmost derivation from a sequence of reductions.

use crate::{grammar::EPSILON, parser::Production};
use std::fmt;

/// The sentential forms of a rightmost derivation, from the start symbol
/// to the parsed sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derivation<'g> {
    forms: Vec<Vec<&'g str>>,
}

impl<'g> Derivation<'g> {
    /// Replay the reductions of an accepted parse in reverse order.
    ///
    /// Each step replaces the rightmost occurrence of the production's head
    /// with its body. A production whose head does not occur in the current
    /// form is skipped.
    pub fn rightmost(start: &'g str, reductions: &[Production<'g>]) -> Self {
        let mut current = vec![start];
        let mut forms = vec![current.clone()];
        for production in reductions.iter().rev() {
            let head = production.head();
            let Some(pos) = current.iter().rposition(|symbol| *symbol == head) else {
                tracing::trace!("skipped `{}': head is not in the sentential form", production);
                continue;
            };
            current.splice(pos..pos + 1, production.body());
            forms.push(current.clone());
        }
        Self { forms }
    }

    pub fn forms(&self) -> &[Vec<&'g str>] {
        &self.forms
    }

    /// Return the last sentential form.
    pub fn sentence(&self) -> &[&'g str] {
        self.forms.last().map(Vec::as_slice).unwrap_or_default()
    }
}

impl fmt::Display for Derivation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, form) in self.forms.iter().enumerate() {
            if i > 0 {
                f.write_str("\n=> ")?;
            }
            if form.is_empty() {
                f.write_str(EPSILON)?;
            } else {
                f.write_str(&form.join(" "))?;
            }
        }
        Ok(())
    }
}
