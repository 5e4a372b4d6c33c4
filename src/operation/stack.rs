use super::{Operation, OperationOptions};
use crate::error::{EditorError, EditorResult};

/// Fixed-order slots for the live operations, one per configured identifier.
///
/// The position of an operation is decided by `operations_order`, never by the order
/// in which operations happen to be created.
#[derive(Debug, Clone)]
pub struct OperationStack {
    order: Vec<String>,
    slots: Vec<Option<Operation>>,
}

impl OperationStack {
    pub fn new(order: Vec<String>) -> Self {
        let slots = vec![None; order.len()];
        Self { order, slots }
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn position(&self, identifier: &str) -> Option<usize> {
        self.order.iter().position(|id| id == identifier)
    }

    pub fn supports(&self, identifier: &str) -> bool {
        self.position(identifier).is_some()
    }

    pub fn get(&self, identifier: &str) -> Option<&Operation> {
        let index = self.position(identifier)?;
        self.slots[index].as_ref()
    }

    pub fn get_mut(&mut self, identifier: &str) -> Option<&mut Operation> {
        let index = self.position(identifier)?;
        self.slots[index].as_mut()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.get(identifier).is_some()
    }

    /// Returns the live operation for `identifier`, creating it with `options` if needed.
    ///
    /// The boolean is `true` when the operation was created by this call.
    pub fn get_or_create(
        &mut self,
        identifier: &str,
        options: OperationOptions,
    ) -> EditorResult<(&mut Operation, bool)> {
        let index = self
            .position(identifier)
            .ok_or_else(|| EditorError::UnknownOperation(identifier.to_owned()))?;
        let slot = &mut self.slots[index];
        let created = slot.is_none();
        let operation = slot.get_or_insert_with(|| Operation::new(identifier, options));
        Ok((operation, created))
    }

    /// Removes the operation and marks every later operation dirty.
    ///
    /// Later operations consume the removed one's output, so their caches are stale.
    /// Earlier operations are untouched.
    pub fn remove(&mut self, identifier: &str) -> Option<Operation> {
        let index = self.position(identifier)?;
        let removed = self.slots[index].take()?;
        for operation in self.slots[index + 1..].iter_mut().flatten() {
            operation.set_dirty(true);
        }
        Some(removed)
    }

    pub fn mark_all_dirty(&mut self) {
        for operation in self.iter_mut() {
            operation.set_dirty(true);
        }
    }

    /// Live operations in stack order
    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.slots.iter().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Operation> {
        self.slots.iter_mut().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack() -> OperationStack {
        OperationStack::new(vec!["crop".into(), "filter".into(), "sprite".into()])
    }

    #[test]
    fn creation_follows_configured_order() {
        let mut stack = stack();
        stack.get_or_create("sprite", OperationOptions::new()).unwrap();
        stack.get_or_create("crop", OperationOptions::new()).unwrap();

        let ids: Vec<&str> = stack.iter().map(Operation::identifier).collect();
        assert_eq!(ids, vec!["crop", "sprite"]);
    }

    #[test]
    fn second_create_returns_existing() {
        let mut stack = stack();
        let (_, created) = stack.get_or_create("filter", OperationOptions::new()).unwrap();
        assert!(created);
        let (_, created) = stack.get_or_create("filter", OperationOptions::new()).unwrap();
        assert!(!created);
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn unknown_identifier_is_rejected() {
        let mut stack = stack();
        let err = stack.get_or_create("brush", OperationOptions::new()).unwrap_err();
        assert!(matches!(err, EditorError::UnknownOperation(id) if id == "brush"));
    }

    #[test]
    fn remove_missing_operation_is_none() {
        let mut stack = stack();
        assert!(stack.remove("filter").is_none());
        assert!(stack.remove("unknown").is_none());
    }
}
