use linfa::Float;
use ndarray::Array1;

/// Active and ignored variables of a running LARS path
///
/// The active variables are kept in order of entry, each with the sign of its
/// correlation at the moment it entered. Ignored variables were found collinear with
/// the active columns and are never reconsidered.
pub(crate) struct ActiveSet<F> {
    members: Vec<usize>,
    signs: Vec<F>,
    is_active: Vec<bool>,
    is_ignored: Vec<bool>,
    ignored: Vec<usize>,
}

impl<F: Float> ActiveSet<F> {
    pub fn new(n_features: usize) -> Self {
        ActiveSet {
            members: Vec::new(),
            signs: Vec::new(),
            is_active: vec![false; n_features],
            is_ignored: vec![false; n_features],
            ignored: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn signs(&self) -> Array1<F> {
        Array1::from(self.signs.clone())
    }

    pub fn is_ignored(&self, idx: usize) -> bool {
        self.is_ignored[idx]
    }

    /// Neither active nor ignored
    pub fn is_eligible(&self, idx: usize) -> bool {
        !self.is_active[idx] && !self.is_ignored[idx]
    }

    pub fn n_ignored(&self) -> usize {
        self.ignored.len()
    }

    pub fn ignored(&self) -> &[usize] {
        &self.ignored
    }

    pub fn insert(&mut self, idx: usize, sign: F) {
        debug_assert!(self.is_eligible(idx));
        self.members.push(idx);
        self.signs.push(sign);
        self.is_active[idx] = true;
    }

    pub fn ignore(&mut self, idx: usize) {
        debug_assert!(self.is_eligible(idx));
        self.is_ignored[idx] = true;
        self.ignored.push(idx);
    }

    /// Remove variable `idx` and return the position it held
    pub fn remove(&mut self, idx: usize) -> Option<usize> {
        let pos = self.members.iter().position(|&m| m == idx)?;
        self.members.remove(pos);
        self.signs.remove(pos);
        self.is_active[idx] = false;
        Some(pos)
    }

    /// Active count, sign count and membership map agree, and no variable is both
    /// active and ignored
    pub fn is_consistent(&self) -> bool {
        self.members.len() == self.signs.len()
            && self.is_active.iter().filter(|&&a| a).count() == self.members.len()
            && self.members.iter().all(|&m| self.is_active[m] && !self.is_ignored[m])
    }
}
