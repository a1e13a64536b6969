// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transient console overlays.
//!
//! Each overlay is its own value owned by the console, either closed or open
//! with its contents. Opening replaces whatever was open; a single dismiss
//! closes it and hands back the contents.

use std::collections::BTreeSet;

use ledgerdesk_core::metrics::{ClosedOpportunity, OverdueInvoice};
use ledgerdesk_core::types::ReminderMethod;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay<T> {
    Closed,
    Open(T),
}

impl<T> Default for Overlay<T> {
    fn default() -> Self {
        Overlay::Closed
    }
}

impl<T> Overlay<T> {
    pub fn open(&mut self, contents: T) {
        *self = Overlay::Open(contents);
    }

    /// Close the overlay, returning what it held.
    pub fn dismiss(&mut self) -> Option<T> {
        match std::mem::replace(self, Overlay::Closed) {
            Overlay::Open(contents) => Some(contents),
            Overlay::Closed => None,
        }
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Overlay::Open(contents) => Some(contents),
            Overlay::Closed => None,
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            Overlay::Open(contents) => Some(contents),
            Overlay::Closed => None,
        }
    }
}

/// Method picker for one overdue invoice. Starts with nothing selected.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderPicker {
    invoice: OverdueInvoice,
    selected: BTreeSet<ReminderMethod>,
}

impl ReminderPicker {
    pub fn new(invoice: OverdueInvoice) -> Self {
        Self {
            invoice,
            selected: BTreeSet::new(),
        }
    }

    pub fn invoice(&self) -> &OverdueInvoice {
        &self.invoice
    }

    /// Flip `method`; returns whether it is now selected.
    pub fn toggle(&mut self, method: ReminderMethod) -> bool {
        if self.selected.remove(&method) {
            false
        } else {
            self.selected.insert(method);
            true
        }
    }

    pub fn is_selected(&self, method: ReminderMethod) -> bool {
        self.selected.contains(&method)
    }

    pub fn methods(&self) -> Vec<ReminderMethod> {
        self.selected.iter().copied().collect()
    }
}

/// Which closed opportunities are listed. `None` lists all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusFilter {
    status: Option<String>,
}

pub const ALL_STATUSES: &str = "All Status";

impl StatusFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn only(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
        }
    }

    pub fn label(&self) -> &str {
        self.status.as_deref().unwrap_or(ALL_STATUSES)
    }

    pub fn matches(&self, opportunity: &ClosedOpportunity) -> bool {
        match &self.status {
            None => true,
            Some(status) => opportunity.status.trim().eq_ignore_ascii_case(status),
        }
    }

    /// Matching opportunities in list order. Console numbering refers to
    /// positions in this filtered view.
    pub fn apply<'a>(&self, list: &'a [ClosedOpportunity]) -> Vec<&'a ClosedOpportunity> {
        list.iter().filter(|opp| self.matches(opp)).collect()
    }
}

/// Options offered by the filter overlay: "All Status" first, then each
/// distinct status present in the list, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterMenu {
    options: Vec<String>,
}

impl FilterMenu {
    pub fn from_opportunities(list: &[ClosedOpportunity]) -> Self {
        let mut options = vec![ALL_STATUSES.to_string()];
        for opp in list {
            let status = opp.status.trim();
            if status.is_empty() {
                continue;
            }
            if !options.iter().any(|o| o.eq_ignore_ascii_case(status)) {
                options.push(status.to_string());
            }
        }
        Self { options }
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Resolve a menu number or a status name (case-insensitive).
    pub fn choose(&self, input: &str) -> Option<StatusFilter> {
        let input = input.trim();
        let picked = match input.parse::<usize>() {
            Ok(index) => self.options.get(index)?,
            Err(_) if input.eq_ignore_ascii_case("all") => return Some(StatusFilter::all()),
            Err(_) => self.options.iter().find(|o| o.eq_ignore_ascii_case(input))?,
        };
        if picked.as_str() == ALL_STATUSES {
            Some(StatusFilter::all())
        } else {
            Some(StatusFilter::only(picked.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opp(name: &str, status: &str) -> ClosedOpportunity {
        ClosedOpportunity {
            opportunity_name: name.into(),
            date: "2026-09-01".into(),
            status: status.into(),
        }
    }

    #[test]
    fn overlay_dismiss_returns_contents_once() {
        let mut overlay = Overlay::Closed;
        assert!(overlay.dismiss().is_none());
        overlay.open(5);
        assert!(overlay.get().is_some());
        assert_eq!(overlay.dismiss(), Some(5));
        assert!(overlay.get().is_none());
        assert_eq!(overlay.dismiss(), None);
    }

    #[test]
    fn opening_replaces_previous_contents() {
        let mut overlay = Overlay::default();
        overlay.open("first");
        overlay.open("second");
        assert_eq!(overlay.get(), Some(&"second"));
    }

    #[test]
    fn picker_toggles_methods() {
        let mut picker = ReminderPicker::new(OverdueInvoice::default());
        assert!(picker.methods().is_empty());
        assert!(picker.toggle(ReminderMethod::Whatsapp));
        assert!(picker.toggle(ReminderMethod::Email));
        assert_eq!(
            picker.methods(),
            vec![ReminderMethod::Email, ReminderMethod::Whatsapp]
        );
        assert!(!picker.toggle(ReminderMethod::Email));
        assert_eq!(picker.methods(), vec![ReminderMethod::Whatsapp]);
    }

    #[test]
    fn picker_overlay_compares_by_invoice_and_selection() {
        let invoice = OverdueInvoice {
            invoice_id: "INV-9".into(),
            amount: Some(420.5),
            ..Default::default()
        };
        let mut overlay = Overlay::default();
        overlay.open(ReminderPicker::new(invoice.clone()));
        let snapshot = overlay.clone();
        assert_eq!(overlay, snapshot);

        if let Some(picker) = overlay.get_mut() {
            picker.toggle(ReminderMethod::Email);
        }
        assert_ne!(overlay, snapshot);
        assert_eq!(overlay.get().unwrap().invoice().amount, Some(420.5));
    }

    #[test]
    fn filter_matches_status_case_insensitively() {
        let list = vec![
            opp("A", "Closed Won"),
            opp("B", "Closed Lost"),
            opp("C", "closed won"),
        ];
        let filter = StatusFilter::only("CLOSED WON");
        let names: Vec<&str> = filter
            .apply(&list)
            .iter()
            .map(|o| o.opportunity_name.as_str())
            .collect();
        assert_eq!(names, vec!["A", "C"]);
        assert_eq!(StatusFilter::all().apply(&list).len(), 3);
    }

    #[test]
    fn menu_lists_distinct_statuses_after_all() {
        let list = vec![
            opp("A", "Closed Won"),
            opp("B", "closed won"),
            opp("C", "Closed Lost"),
        ];
        let menu = FilterMenu::from_opportunities(&list);
        assert_eq!(menu.options(), ["All Status", "Closed Won", "Closed Lost"]);
        assert_eq!(menu.choose("2"), Some(StatusFilter::only("Closed Lost")));
        assert_eq!(menu.choose("closed won"), Some(StatusFilter::only("Closed Won")));
        assert_eq!(menu.choose("all"), Some(StatusFilter::all()));
        assert_eq!(menu.choose("0"), Some(StatusFilter::all()));
        assert_eq!(menu.choose("9"), None);
        assert_eq!(menu.choose("pending"), None);
    }
}
