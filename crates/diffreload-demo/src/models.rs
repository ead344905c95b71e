#![forbid(unsafe_code)]

//! Synthetic cars and motorcycles.
//!
//! Generation is seeded, so a given `--seed` always produces the same fleet.

/// Small deterministic generator (SplitMix64).
#[derive(Debug, Clone)]
pub struct Rng(u64);

impl Rng {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform value in `0..bound`. `bound` must be non-zero.
    pub fn below(&mut self, bound: u64) -> u64 {
        self.next_u64() % bound
    }

    pub fn chance(&mut self, one_in: u64) -> bool {
        self.below(one_in) == 0
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        let idx = self.below(items.len() as u64) as usize;
        &items[idx]
    }

    /// Color channel in `0.5..=1.0`, quantized to 1/256 steps.
    pub fn channel(&mut self) -> f32 {
        0.5 + (self.below(129) as f32) / 256.0
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.below(i as u64 + 1) as usize;
            items.swap(i, j);
        }
    }

    fn token(&mut self, len: usize) -> String {
        const ALPHABET: &[u8] = b"0123456789ABCDEFGHJKLMNPRSTUVWXYZ";
        (0..len)
            .map(|_| char::from(*self.pick(ALPHABET)))
            .collect()
    }

    /// Registration plate; one in `none_one_in` vehicles has none.
    pub fn plate(&mut self, none_one_in: u64) -> Option<String> {
        if self.chance(none_one_in) {
            None
        } else {
            Some(self.token(6))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CarBrand {
    Ford,
    Volkswagen,
    Tesla,
    Toyota,
    MercedesBenz,
}

impl CarBrand {
    pub const ALL: [Self; 5] = [
        Self::Ford,
        Self::Volkswagen,
        Self::Tesla,
        Self::Toyota,
        Self::MercedesBenz,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Ford => "Ford",
            Self::Volkswagen => "Volkswagen",
            Self::Tesla => "Tesla",
            Self::Toyota => "Toyota",
            Self::MercedesBenz => "Mercedes-Benz",
        }
    }

    #[must_use]
    pub fn models(self) -> &'static [&'static str] {
        match self {
            Self::Ford => &["Expedition", "Mustang", "Explorer", "Edge", "Super Duty"],
            Self::Volkswagen => &["Golf", "ID.3", "Passat"],
            Self::Tesla => &["Model X", "Model S", "Model Y"],
            Self::Toyota => &["Camry", "Corolla", "Mirai", "RAV4"],
            Self::MercedesBenz => &["A-Class", "E-Class", "CLA", "CLS", "Maybach"],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Car {
    pub vin: String,
    pub registration_plate: Option<String>,
    pub brand: CarBrand,
    pub model: &'static str,
    pub price: u32,
    pub color: [f32; 3],
    /// Not displayed, so never part of a fingerprint.
    pub instruction_manual: Vec<u8>,
}

impl Car {
    pub fn generate(rng: &mut Rng, brand: Option<CarBrand>) -> Self {
        let brand = brand.unwrap_or_else(|| *rng.pick(&CarBrand::ALL));
        Self {
            vin: format!("VIN{}", rng.token(14)),
            registration_plate: rng.plate(8),
            brand,
            model: *rng.pick(brand.models()),
            price: (10 + rng.below(41) as u32) * 1000,
            color: [rng.channel(), rng.channel(), rng.channel()],
            instruction_manual: rng.token(24).into_bytes(),
        }
    }

    pub fn change_color(&mut self, rng: &mut Rng) {
        self.color = [rng.channel(), rng.channel(), rng.channel()];
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotorcycleBrand {
    Ducati,
    HarleyDavidson,
    Kawasaki,
}

impl MotorcycleBrand {
    pub const ALL: [Self; 3] = [Self::Ducati, Self::HarleyDavidson, Self::Kawasaki];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Ducati => "Ducati",
            Self::HarleyDavidson => "Harley-Davidson",
            Self::Kawasaki => "Kawasaki",
        }
    }

    #[must_use]
    pub fn models(self) -> &'static [&'static str] {
        match self {
            Self::Ducati => &["Panigale", "Multistrada", "Diavel", "Supersport"],
            Self::HarleyDavidson => &["Fat Boy", "Breakout", "Tracer"],
            Self::Kawasaki => &["Ninja", "Vulcan", "Concours"],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Motorcycle {
    pub vin: i64,
    pub registration_plate: Option<String>,
    pub brand: MotorcycleBrand,
    pub model: &'static str,
    pub price: u32,
    pub instruction_manual: Vec<u8>,
}

impl Motorcycle {
    pub fn generate(rng: &mut Rng, brand: Option<MotorcycleBrand>) -> Self {
        let brand = brand.unwrap_or_else(|| *rng.pick(&MotorcycleBrand::ALL));
        Self {
            vin: rng.next_u64() as i64,
            registration_plate: rng.plate(8),
            brand,
            model: *rng.pick(brand.models()),
            price: (3 + rng.below(48) as u32) * 1000,
            instruction_manual: rng.token(24).into_bytes(),
        }
    }

    /// New plate, or none half of the time.
    pub fn change_registration_plate(&mut self, rng: &mut Rng) {
        self.registration_plate = rng.plate(2);
    }
}
