#![no_main]

use std::cell::RefCell;
use std::rc::Rc;

use arbitrary::Arbitrary;
use diffreload_core::{
    ApplyOptions, Arrangement, DuplicatePolicy, ReloadConfig, ReloadingDataSource, VirtualSurface,
};
use libfuzzer_sys::fuzz_target;

const ITEMS: u8 = 16;

#[derive(Arbitrary, Debug)]
enum FuzzStep {
    Bump(u8),
    Vanish(u8),
    Restore(u8),
    Move { item: u8, to_second: bool, position: u8 },
    Hide(u8),
    Show(u8),
    SwapSections,
    Scroll(u8),
}

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    allow_transient: bool,
    pool_limit: u8,
    steps: Vec<FuzzStep>,
}

struct Layout {
    sections: [(u8, Vec<u8>); 2],
}

impl Layout {
    fn remove(&mut self, item: u8) -> bool {
        for (_, items) in &mut self.sections {
            if let Some(idx) = items.iter().position(|i| *i == item) {
                items.remove(idx);
                return true;
            }
        }
        false
    }

    fn arrangement(&self) -> Arrangement<u8, u8> {
        Arrangement::from_sections(self.sections.iter().cloned()).expect("items stay unique")
    }
}

fuzz_target!(|input: FuzzInput| {
    let revisions: Rc<RefCell<Vec<Option<u32>>>> =
        Rc::new(RefCell::new((0..ITEMS).map(|_| Some(0)).collect()));
    let lookup = Rc::clone(&revisions);

    let policy = if input.allow_transient {
        DuplicatePolicy::AllowTransient
    } else {
        DuplicatePolicy::EvictOthers
    };
    let mut source = ReloadingDataSource::builder(
        VirtualSurface::<u8, u8>::new()
            .with_visible_limit(8)
            .with_pool_limit(usize::from(input.pool_limit % 8)),
    )
    .row_provider(|_, _| true)
    .content_provider(move |id: &u8| lookup.borrow().get(usize::from(*id)).copied().flatten())
    .config(ReloadConfig::default().with_duplicate_policy(policy))
    .build()
    .expect("both providers set");

    let mut layout = Layout {
        sections: [(0, (0..ITEMS / 2).collect()), (1, (ITEMS / 2..ITEMS).collect())],
    };

    for step in input.steps.into_iter().take(64) {
        match step {
            FuzzStep::Bump(id) => {
                if let Some(Some(rev)) = revisions.borrow_mut().get_mut(usize::from(id % ITEMS)) {
                    *rev = rev.wrapping_add(1);
                }
            }
            FuzzStep::Vanish(id) => revisions.borrow_mut()[usize::from(id % ITEMS)] = None,
            FuzzStep::Restore(id) => {
                let mut revisions = revisions.borrow_mut();
                let slot = &mut revisions[usize::from(id % ITEMS)];
                slot.get_or_insert(0);
            }
            FuzzStep::Move { item, to_second, position } => {
                let item = item % ITEMS;
                if layout.remove(item) {
                    let items = &mut layout.sections[usize::from(to_second)].1;
                    let at = usize::from(position) % (items.len() + 1);
                    items.insert(at, item);
                }
            }
            FuzzStep::Hide(id) => {
                layout.remove(id % ITEMS);
            }
            FuzzStep::Show(id) => {
                let id = id % ITEMS;
                let present = layout.sections.iter().any(|(_, items)| items.contains(&id));
                if !present {
                    layout.sections[0].1.push(id);
                }
            }
            FuzzStep::SwapSections => layout.sections.swap(0, 1),
            FuzzStep::Scroll(limit) => source
                .surface_mut()
                .set_visible_limit(Some(usize::from(limit % (ITEMS + 1)))),
        }

        source
            .apply_with_reload(layout.arrangement(), ApplyOptions::immediate())
            .expect("arrangement carries no reload marks");
        source.surface_mut().take_history();

        for (id, row) in source.surface().visible_rows() {
            let record = source.store().record_for(row).expect("visible row has a record");
            assert_eq!(record.identifier(), id);
            let expected = revisions.borrow()[usize::from(*id)];
            assert_eq!(record.fingerprint().copied(), expected);
        }

        if !input.allow_transient {
            for id in 0..ITEMS {
                assert!(source.store().rows_for(&id).count() <= 1);
            }
        }
    }
});
