pub mod usage;

/// A studio section that takes over the keyboard while it is active
pub trait SectionActivation {
    fn activate(&mut self);
    fn deactivate(&mut self);
}
