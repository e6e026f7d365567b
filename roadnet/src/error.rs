use std::fmt;

use lri::{PoolId, PoolKind};

/// Something tried to use an ID that doesn't name a record, or a record through the wrong
/// parent. Always a bug in the caller or a corrupt network; carries enough to say which.
#[derive(Clone, Debug, PartialEq)]
pub struct BindingError {
    pub pool: PoolKind,
    pub index: u32,
    pub op: &'static str,
}

impl BindingError {
    pub fn new<I: PoolId>(id: I, op: &'static str) -> BindingError {
        BindingError {
            pool: I::POOL,
            index: id.raw(),
            op,
        }
    }
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.index == 0 {
            write!(f, "{}: unbound {:?} reference", self.op, self.pool)
        } else {
            write!(f, "{}: {:?} #{} doesn't exist", self.op, self.pool, self.index)
        }
    }
}

impl std::error::Error for BindingError {}

#[cfg(test)]
mod tests {
    use super::*;
    use lri::{LaneID, RoadID};

    #[test]
    fn messages_name_the_record() {
        let err = BindingError::new(RoadID(12), "road");
        assert_eq!(err.pool, PoolKind::Roads);
        assert_eq!(err.to_string(), "road: Roads #12 doesn't exist");
        assert_eq!(
            BindingError::new(LaneID::NULL, "lane").to_string(),
            "lane: unbound Lanes reference"
        );
    }
}
