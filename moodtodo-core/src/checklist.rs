//! Checklist item transforms
//!
//! Each helper works on a fresh copy of the checklist and returns the new
//! sequence, ready to be handed to `TaskStore::update_checklist`. The input
//! slice is never modified.

use crate::error::{CoreError, Result};
use crate::task::ChecklistItem;

fn check_index(items: &[ChecklistItem], index: usize) -> Result<()> {
    if index < items.len() {
        Ok(())
    } else {
        Err(CoreError::validation(
            "checklist",
            format!(
                "item index {} out of range ({} item{})",
                index,
                items.len(),
                if items.len() == 1 { "" } else { "s" }
            ),
        ))
    }
}

/// Flip the `checked` flag of the item at `index`
pub fn toggle_item(items: &[ChecklistItem], index: usize) -> Result<Vec<ChecklistItem>> {
    check_index(items, index)?;
    let mut updated = items.to_vec();
    updated[index].checked = !updated[index].checked;
    Ok(updated)
}

/// Append an unchecked item (text is trimmed, blank text rejected)
pub fn append_item(items: &[ChecklistItem], text: &str) -> Result<Vec<ChecklistItem>> {
    let text = text.trim();
    if text.is_empty() {
        return Err(CoreError::validation(
            "checklist",
            "item text must not be empty",
        ));
    }
    let mut updated = items.to_vec();
    updated.push(ChecklistItem::new(text));
    Ok(updated)
}

/// Remove the item at `index`, keeping the order of the rest
pub fn remove_item(items: &[ChecklistItem], index: usize) -> Result<Vec<ChecklistItem>> {
    check_index(items, index)?;
    let mut updated = items.to_vec();
    updated.remove(index);
    Ok(updated)
}
