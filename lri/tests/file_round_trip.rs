use lri::{synthetic, PoolKind, Pools, HEADER_SIZE, RESERVED_ATTRS, RESERVED_OBJS};
use netutil::Timer;

#[test]
fn bytes_are_stable() {
    for pools in [
        synthetic::straight_road(2).unwrap(),
        synthetic::four_way().unwrap(),
        synthetic::ring().unwrap(),
    ] {
        let mut bytes = Vec::new();
        pools.write_to(&mut bytes).unwrap();
        assert_eq!(bytes.len() % 8, 0);
        let back = Pools::read_from(&mut bytes.as_slice()).unwrap();
        assert_eq!(back.to_bytes().unwrap(), bytes);
        for kind in PoolKind::ALL {
            assert_eq!(back.count(kind), pools.count(kind), "{:?} changed size", kind);
        }
        assert!(back.validate(&mut Timer::throwaway()).is_ok());
    }
}

#[test]
fn records_survive() {
    let pools = synthetic::four_way().unwrap();
    let back = Pools::from_bytes(&pools.to_bytes().unwrap()).unwrap();

    let east = back.road_by_name("East").unwrap();
    assert_eq!(east, pools.road_by_name("East").unwrap());
    assert_eq!(back.roads.get(east), pools.roads.get(east));
    for (id, c) in pools.crdrs.iter() {
        assert_eq!(back.crdrs.get(id), Some(c));
    }
    for (id, h) in pools.hld_ofs.iter() {
        assert_eq!(back.hld_ofs.get(id), Some(h));
    }
    for (id, o) in pools.objs.iter() {
        assert_eq!(back.objs.get(id), Some(o));
        assert_eq!(back.name(o.name), pools.name(o.name));
    }
}

#[test]
fn reserved_capacity_is_written() {
    let pools = synthetic::four_way().unwrap();
    let bytes = pools.to_bytes().unwrap();
    let back = Pools::from_bytes(&bytes).unwrap();
    assert_eq!(back.objs.reserved(), RESERVED_OBJS);
    assert_eq!(back.attrs.reserved(), RESERVED_ATTRS);
    // The header, plus at least the reserved slots
    assert!(bytes.len() > HEADER_SIZE + RESERVED_OBJS * 112 + RESERVED_ATTRS * 48);
}

#[test]
fn save_and_load() {
    let pools = synthetic::ring().unwrap();
    let path = std::env::temp_dir().join(format!("ring_{}.lri", std::process::id()));
    pools.save(&path).unwrap();
    let loaded = Pools::load(&path, &mut Timer::throwaway()).unwrap();
    assert_eq!(loaded.to_bytes().unwrap(), pools.to_bytes().unwrap());
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn truncated_file_is_rejected() {
    let bytes = synthetic::straight_road(1).unwrap().to_bytes().unwrap();
    assert!(Pools::from_bytes(&bytes[0..bytes.len() / 2]).is_err());
    assert!(Pools::from_bytes(&bytes[0..HEADER_SIZE - 1]).is_err());
}
