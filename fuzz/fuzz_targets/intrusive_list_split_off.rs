#![no_main]

use libfuzzer_sys::fuzz_target;
use ttl_lru::ds::IntrusiveList;

// Fuzz push/move/remove followed by split_off at an arbitrary node
//
// The detached values must be exactly the tail of the front-to-back order
// starting at the split node, and the remaining list must stay consistent
// and reusable.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let mut list: IntrusiveList<u32> = IntrusiveList::new();
    let mut ids = Vec::new();

    for (i, pair) in data[1..].chunks_exact(2).enumerate() {
        match pair[0] % 3 {
            0 => ids.push(list.push_front(i as u32)),
            1 if !ids.is_empty() => {
                let id = ids[usize::from(pair[1]) % ids.len()];
                list.move_to_front(id);
            }
            2 if !ids.is_empty() => {
                let id = ids.swap_remove(usize::from(pair[1]) % ids.len());
                list.remove(id);
            }
            _ => {}
        }
        list.check_invariants().unwrap();
    }

    if ids.is_empty() {
        return;
    }
    let at = ids[usize::from(data[0]) % ids.len()];
    let order: Vec<_> = list.iter_entries().map(|(id, v)| (id, *v)).collect();
    let cut = order.iter().position(|(id, _)| *id == at).unwrap();

    let detached = list.split_off(at);
    let expected: Vec<u32> = order[cut..].iter().map(|(_, v)| *v).collect();
    assert_eq!(detached, expected);
    assert_eq!(list.len(), cut);
    list.check_invariants().unwrap();

    list.push_front(u32::MAX);
    assert_eq!(list.iter().next(), Some(&u32::MAX));
    list.check_invariants().unwrap();
});
