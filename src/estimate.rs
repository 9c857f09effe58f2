//! Canned rent estimates keyed by address text. No market data is fetched.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparable {
    pub rent: f64,
    pub beds: i32,
    pub baths: i32,
    pub sqft: f64,
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RentEstimate {
    pub sqft: f64,
    pub beds: i32,
    pub baths: i32,
    pub est_rent: f64,
    pub comps: Vec<Comparable>,
}

struct Subject {
    sqft: f64,
    beds: i32,
    baths: i32,
    rent: f64,
}

static DEFAULT_SUBJECT: Subject = Subject {
    sqft: 2000.0,
    beds: 3,
    baths: 2,
    rent: 3200.0,
};

static MARKETS: [(&[&str], Subject); 3] = [
    (
        &["lafayette", "94549"],
        Subject {
            sqft: 3500.0,
            beds: 5,
            baths: 5,
            rent: 13250.0,
        },
    ),
    (
        &["walnut creek", "94596", "94597"],
        Subject {
            sqft: 2800.0,
            beds: 4,
            baths: 3,
            rent: 6200.0,
        },
    ),
    (
        &["oakland", "946"],
        Subject {
            sqft: 2200.0,
            beds: 3,
            baths: 2,
            rent: 4200.0,
        },
    ),
];

pub fn estimate(address: &str) -> RentEstimate {
    let needle = address.to_lowercase();
    let subject = MARKETS
        .iter()
        .find(|(keys, _)| keys.iter().any(|k| needle.contains(k)))
        .map_or(&DEFAULT_SUBJECT, |(_, s)| s);

    let comps = vec![
        Comparable {
            rent: (subject.rent * 0.97).round(),
            beds: subject.beds,
            baths: subject.baths,
            sqft: (subject.sqft * 0.97).round(),
            distance: 0.6,
        },
        Comparable {
            rent: (subject.rent * 1.02).round(),
            beds: subject.beds,
            baths: subject.baths,
            sqft: (subject.sqft * 1.01).round(),
            distance: 0.8,
        },
        Comparable {
            rent: (subject.rent * 1.01).round(),
            beds: subject.beds - 1,
            baths: subject.baths - 1,
            sqft: (subject.sqft * 0.95).round(),
            distance: 1.2,
        },
    ];

    RentEstimate {
        sqft: subject.sqft,
        beds: subject.beds,
        baths: subject.baths,
        est_rent: subject.rent,
        comps,
    }
}
