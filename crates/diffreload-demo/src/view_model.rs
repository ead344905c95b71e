#![forbid(unsafe_code)]

//! The garage: cars and motorcycles laid out in two sections.
//!
//! Every action mutates the backing records and/or the layout; the app then
//! hands the resulting arrangement to `apply_with_reload`. Actions that only
//! touch records leave the arrangement unchanged, which is exactly the case a
//! plain diffable apply misses.

use ahash::AHashMap;
use diffreload_content::{EncodableContent, EncodedFingerprint, HashFingerprint, HashableContent};
use diffreload_core::{Arrangement, ArrangementError};

use crate::models::{Car, CarBrand, Motorcycle, MotorcycleBrand, Rng};

const CARS_IN_SECTION_ONE: usize = 4;
const RANDOM_CARS: usize = 3;
const RANDOM_MOTORCYCLES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionId {
    One,
    Two,
}

impl SectionId {
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::One => "Section One",
            Self::Two => "Section Two",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemId {
    Car(String),
    Motorcycle(i64),
}

impl ItemId {
    #[must_use]
    pub fn is_motorcycle(&self) -> bool {
        matches!(self, Self::Motorcycle(_))
    }
}

/// What a row displays.
#[derive(Debug, Clone, PartialEq)]
pub struct CellViewModel {
    pub text: Option<String>,
    pub detail_text: Option<String>,
    pub background: [f32; 3],
}

impl CellViewModel {
    /// Unique fingerprint over every displayed field.
    #[must_use]
    pub fn exact_fingerprint(&self) -> Option<EncodedFingerprint> {
        EncodableContent::of(self)
            .field(|c| &c.text)
            .field(|c| &c.detail_text)
            .field(|c| c.background)
            .data()
    }

    /// Hashed fingerprint over the same fields.
    #[must_use]
    pub fn fast_fingerprint(&self) -> HashFingerprint {
        HashableContent::of(self)
            .field(|c| &c.text)
            .field(|c| &c.detail_text)
            .field(|c| c.background.map(f32::to_bits))
            .hash_value()
    }

    /// One-line rendering used by the headless screen.
    #[must_use]
    pub fn render(&self) -> String {
        let [r, g, b] = self.background.map(|c| (c * 255.0).round() as u8);
        format!(
            "{:<36} {:>8}  #{r:02x}{g:02x}{b:02x}",
            self.text.as_deref().unwrap_or(""),
            self.detail_text.as_deref().unwrap_or(""),
        )
    }
}

/// User-facing actions, in the order the demo runs them by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    IncreaseFordPrices,
    ChangeVolkswagenColors,
    ChangeDucatiPlates,
    MoveMotorcycle,
    SwitchSections,
    Shuffle,
}

impl Action {
    pub const ALL: [Self; 6] = [
        Self::IncreaseFordPrices,
        Self::ChangeVolkswagenColors,
        Self::ChangeDucatiPlates,
        Self::MoveMotorcycle,
        Self::SwitchSections,
        Self::Shuffle,
    ];

    /// Short name accepted on the command line.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::IncreaseFordPrices => "ford",
            Self::ChangeVolkswagenColors => "vw",
            Self::ChangeDucatiPlates => "ducati",
            Self::MoveMotorcycle => "move",
            Self::SwitchSections => "switch",
            Self::Shuffle => "shuffle",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::IncreaseFordPrices => "Increase price of all Ford cars",
            Self::ChangeVolkswagenColors => "Change color of all Volkswagen cars",
            Self::ChangeDucatiPlates => "Change plates of all Ducati motorcycles",
            Self::MoveMotorcycle => "Increase prices, change plates and move a motorcycle",
            Self::SwitchSections => "Switch sections",
            Self::Shuffle => "Increase prices, change colors and shuffle section one",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.name() == name)
    }
}

/// Backing records plus the current layout.
#[derive(Debug, Clone)]
pub struct Garage {
    cars: Vec<Car>,
    motorcycles: Vec<Motorcycle>,
    section_order: Vec<SectionId>,
    directory: AHashMap<SectionId, Vec<ItemId>>,
    rng: Rng,
}

impl Garage {
    /// Seeded fleet: a Volkswagen and two Fords among the cars, two Ducatis
    /// among the motorcycles. Section one holds the first cars and every
    /// motorcycle, shuffled; section two holds the remaining cars.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let mut rng = Rng::new(seed);

        let mut cars: Vec<Car> = (0..RANDOM_CARS)
            .map(|_| Car::generate(&mut rng, None))
            .collect();
        cars.push(Car::generate(&mut rng, Some(CarBrand::Volkswagen)));
        cars.push(Car::generate(&mut rng, Some(CarBrand::Ford)));
        cars.push(Car::generate(&mut rng, Some(CarBrand::Ford)));

        let mut motorcycles: Vec<Motorcycle> = (0..RANDOM_MOTORCYCLES)
            .map(|_| Motorcycle::generate(&mut rng, None))
            .collect();
        motorcycles.push(Motorcycle::generate(&mut rng, Some(MotorcycleBrand::Ducati)));
        motorcycles.push(Motorcycle::generate(&mut rng, Some(MotorcycleBrand::Ducati)));

        let mut section_one: Vec<ItemId> = cars[..CARS_IN_SECTION_ONE]
            .iter()
            .map(|car| ItemId::Car(car.vin.clone()))
            .chain(motorcycles.iter().map(|m| ItemId::Motorcycle(m.vin)))
            .collect();
        rng.shuffle(&mut section_one);
        let section_two: Vec<ItemId> = cars[CARS_IN_SECTION_ONE..]
            .iter()
            .map(|car| ItemId::Car(car.vin.clone()))
            .collect();

        let mut directory = AHashMap::new();
        directory.insert(SectionId::One, section_one);
        directory.insert(SectionId::Two, section_two);

        Self {
            cars,
            motorcycles,
            section_order: vec![SectionId::One, SectionId::Two],
            directory,
            rng,
        }
    }

    /// Current layout as an arrangement.
    pub fn arrangement(&self) -> Result<Arrangement<SectionId, ItemId>, ArrangementError> {
        Arrangement::from_sections(self.section_order.iter().map(|section| {
            let items = self.directory.get(section).cloned().unwrap_or_default();
            (*section, items)
        }))
    }

    #[must_use]
    pub fn cell_view_model(&self, id: &ItemId) -> Option<CellViewModel> {
        match id {
            ItemId::Car(vin) => {
                let car = self.cars.iter().find(|car| &car.vin == vin)?;
                Some(CellViewModel {
                    text: Some(label(car.brand.name(), car.model, car.registration_plate.as_deref())),
                    detail_text: Some(format!("${}", car.price)),
                    background: car.color,
                })
            }
            ItemId::Motorcycle(vin) => {
                let motorcycle = self.motorcycles.iter().find(|m| m.vin == *vin)?;
                Some(CellViewModel {
                    text: Some(label(
                        motorcycle.brand.name(),
                        motorcycle.model,
                        motorcycle.registration_plate.as_deref(),
                    )),
                    detail_text: Some(format!("${}", motorcycle.price)),
                    background: [1.0, 1.0, 1.0],
                })
            }
        }
    }

    pub fn perform(&mut self, action: Action) {
        match action {
            Action::IncreaseFordPrices => self.increase_ford_prices(),
            Action::ChangeVolkswagenColors => self.change_volkswagen_colors(),
            Action::ChangeDucatiPlates => self.change_ducati_plates(),
            Action::MoveMotorcycle => {
                self.increase_ford_prices();
                self.change_ducati_plates();
                self.move_motorcycle();
            }
            Action::SwitchSections => self.section_order.rotate_left(1),
            Action::Shuffle => {
                self.increase_ford_prices();
                self.change_volkswagen_colors();
                if let Some(items) = self.directory.get_mut(&SectionId::One) {
                    self.rng.shuffle(items);
                }
            }
        }
    }

    fn increase_ford_prices(&mut self) {
        for car in self.cars.iter_mut().filter(|c| c.brand == CarBrand::Ford) {
            car.price += 1;
        }
    }

    fn change_volkswagen_colors(&mut self) {
        for car in self
            .cars
            .iter_mut()
            .filter(|c| c.brand == CarBrand::Volkswagen)
        {
            car.change_color(&mut self.rng);
        }
    }

    fn change_ducati_plates(&mut self) {
        for motorcycle in self
            .motorcycles
            .iter_mut()
            .filter(|m| m.brand == MotorcycleBrand::Ducati)
        {
            motorcycle.change_registration_plate(&mut self.rng);
        }
    }

    /// Move the last motorcycle of section one to the top of section two, or
    /// back when section one has none.
    fn move_motorcycle(&mut self) {
        let has_motorcycle = |section: SectionId, directory: &AHashMap<SectionId, Vec<ItemId>>| {
            directory
                .get(&section)
                .is_some_and(|items| items.iter().any(ItemId::is_motorcycle))
        };
        let (from, to) = if has_motorcycle(SectionId::One, &self.directory) {
            (SectionId::One, SectionId::Two)
        } else {
            (SectionId::Two, SectionId::One)
        };

        let Some(source) = self.directory.get_mut(&from) else {
            return;
        };
        let Some(index) = source.iter().rposition(ItemId::is_motorcycle) else {
            return;
        };
        let moving = source.remove(index);
        self.directory.entry(to).or_default().insert(0, moving);
    }
}

fn label(brand: &str, model: &str, plate: Option<&str>) -> String {
    match plate {
        Some(plate) => format!("{brand} {model} {plate}"),
        None => format!("{brand} {model}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(garage: &Garage, section: SectionId) -> Vec<ItemId> {
        garage.directory.get(&section).cloned().unwrap_or_default()
    }

    #[test]
    fn initial_layout() {
        let garage = Garage::new(2021);
        let arrangement = garage.arrangement().expect("valid layout");
        assert_eq!(arrangement.number_of_sections(), 2);
        assert_eq!(arrangement.number_of_items(), 6 + 5);
        assert_eq!(items(&garage, SectionId::Two).len(), 2);
        assert!(
            items(&garage, SectionId::Two)
                .iter()
                .all(|id| !id.is_motorcycle())
        );
    }

    #[test]
    fn ford_prices_change_cells_but_not_layout() {
        let mut garage = Garage::new(5);
        let before = garage.arrangement().expect("layout");
        let ford = ItemId::Car(garage.cars[5].vin.clone());
        let cell_before = garage.cell_view_model(&ford).expect("ford cell");

        garage.perform(Action::IncreaseFordPrices);
        assert_eq!(garage.arrangement().expect("layout"), before);
        let cell_after = garage.cell_view_model(&ford).expect("ford cell");
        assert_ne!(cell_before.detail_text, cell_after.detail_text);
        assert_ne!(cell_before.exact_fingerprint(), cell_after.exact_fingerprint());
        assert_ne!(cell_before.fast_fingerprint(), cell_after.fast_fingerprint());
    }

    #[test]
    fn move_motorcycle_alternates_sections() {
        let mut garage = Garage::new(11);
        let motorcycles_in_one = |g: &Garage| {
            items(g, SectionId::One)
                .iter()
                .filter(|id| id.is_motorcycle())
                .count()
        };
        assert_eq!(motorcycles_in_one(&garage), 5);
        garage.perform(Action::MoveMotorcycle);
        assert_eq!(motorcycles_in_one(&garage), 4);
        assert!(items(&garage, SectionId::Two)[0].is_motorcycle());
        garage.arrangement().expect("moved layout stays valid");
    }

    #[test]
    fn switch_sections_rotates_order() {
        let mut garage = Garage::new(1);
        garage.perform(Action::SwitchSections);
        let arrangement = garage.arrangement().expect("layout");
        let order: Vec<SectionId> = arrangement.section_identifiers().copied().collect();
        assert_eq!(order, vec![SectionId::Two, SectionId::One]);
    }

    #[test]
    fn unknown_item_has_no_cell() {
        let garage = Garage::new(1);
        assert!(garage.cell_view_model(&ItemId::Car("nope".into())).is_none());
    }

    #[test]
    fn action_names_round_trip() {
        for action in Action::ALL {
            assert_eq!(Action::from_name(action.name()), Some(action));
        }
        assert_eq!(Action::from_name("teleport"), None);
    }
}
