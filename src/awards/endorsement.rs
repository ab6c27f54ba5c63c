use crate::awards::types::Endorsement;

/// Highest endorsement whose threshold is at or below `count`.
/// `endorsements` must be sorted by ascending threshold.
pub fn active_endorsement(endorsements: &[Endorsement], count: u32) -> Option<&Endorsement> {
    let reached = endorsements.partition_point(|endorsement| endorsement.threshold <= count);
    reached.checked_sub(1).map(|index| &endorsements[index])
}

/// First endorsement still above `count`.
pub fn next_endorsement(endorsements: &[Endorsement], count: u32) -> Option<&Endorsement> {
    let reached = endorsements.partition_point(|endorsement| endorsement.threshold <= count);
    endorsements.get(reached)
}

/// Endorsement past the listed ladder, labelled by its multiple of the award target.
pub fn stepped_endorsement(name: &str, target: u32, threshold: u32) -> Endorsement {
    Endorsement::new(threshold, format!("{name} x{}", threshold / target.max(1)))
}
