use std::{f32::consts::PI, str::FromStr};

use comms::specs::DataPoint;
use rand::Rng;
use rand_distr::{Distribution as _, Normal, Uniform};

use crate::{MlErr, Result};

const NOISE: f32 = 0.05;
const BLOB_STD: f32 = 0.1;

/// The synthetic datasets that can be generated, every point lying in `[-1, 1]^2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distribution {
    /// Concentric rings, the outermost one being class `0`.
    Circles,
    /// Interleaving half moons.
    Moons,
    /// Isotropic gaussian clusters around a circle of radius `0.6`.
    Blobs,
    /// Gaussian clusters stretched by a fixed linear map.
    Anisotropic,
    /// Gaussian clusters whose spread grows with the class index.
    VariedVariance,
}

impl FromStr for Distribution {
    type Err = MlErr;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "circles" => Ok(Self::Circles),
            "moons" => Ok(Self::Moons),
            "blobs" => Ok(Self::Blobs),
            "anisotropic" => Ok(Self::Anisotropic),
            "varied_variance" => Ok(Self::VariedVariance),
            other => Err(MlErr::UnknownDistribution(other.to_string())),
        }
    }
}

impl Distribution {
    /// Generates a new dataset.
    ///
    /// # Arguments
    /// * `n_samples` - The amount of points to generate.
    /// * `n_classes` - The amount of distinct labels, must be positive.
    /// * `rng` - The random source.
    ///
    /// # Returns
    /// The generated points, or an error if `n_classes` is zero.
    pub fn generate<R: Rng>(
        self,
        n_samples: usize,
        n_classes: usize,
        rng: &mut R,
    ) -> Result<Vec<DataPoint>> {
        if n_classes == 0 {
            return Err(MlErr::InvalidDistribution(
                "there must be at least one class".into(),
            ));
        }

        match self {
            Self::Circles => circles(n_samples, n_classes, rng),
            Self::Moons => moons(n_samples, n_classes, rng),
            Self::Blobs => blobs(n_samples, n_classes, rng, |rng, noise| {
                (noise.sample(rng), noise.sample(rng))
            }),
            Self::Anisotropic => blobs(n_samples, n_classes, rng, |rng, noise| {
                let (a, b) = (noise.sample(rng), noise.sample(rng));
                (0.6 * a - 0.4 * b, -0.6 * a + 0.8 * b)
            }),
            Self::VariedVariance => varied_variance(n_samples, n_classes, rng),
        }
    }
}

/// Splits `n_samples` evenly across the classes, the remainder going to the last one.
fn class_sizes(n_samples: usize, n_classes: usize) -> impl Iterator<Item = (usize, usize)> {
    let per_class = n_samples / n_classes;
    (0..n_classes).map(move |label| {
        let count = if label + 1 == n_classes {
            n_samples - per_class * (n_classes - 1)
        } else {
            per_class
        };

        (label, count)
    })
}

/// Points evenly spaced around a circle of the given radius, one per class.
fn centers(n_classes: usize, radius: f32) -> Vec<(f32, f32)> {
    (0..n_classes)
        .map(|i| {
            let angle = 2. * PI * i as f32 / n_classes as f32;
            (radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

/// Samples with `sample` until the point falls inside the unit square.
fn rejection<R, F>(rng: &mut R, label: usize, mut sample: F) -> DataPoint
where
    R: Rng,
    F: FnMut(&mut R) -> (f32, f32),
{
    loop {
        let (x, y) = sample(rng);

        if (-1. ..=1.).contains(&x) && (-1. ..=1.).contains(&y) {
            return DataPoint::new(x, y, label);
        }
    }
}

fn circles<R: Rng>(n_samples: usize, n_classes: usize, rng: &mut R) -> Result<Vec<DataPoint>> {
    let angle = Uniform::new(0., 2. * PI)?;
    let noise = Normal::new(0., NOISE)?;
    let mut points = Vec::with_capacity(n_samples);

    for (label, count) in class_sizes(n_samples, n_classes) {
        let radius = match n_classes {
            1 => 1.,
            n => 1. - label as f32 * 0.8 / (n - 1) as f32,
        };

        points.extend((0..count).map(|_| {
            rejection(&mut *rng, label, |rng| {
                let t: f32 = angle.sample(rng);
                (
                    t.cos() * radius + noise.sample(rng),
                    t.sin() * radius + noise.sample(rng),
                )
            })
        }));
    }

    Ok(points)
}

fn moons<R: Rng>(n_samples: usize, n_classes: usize, rng: &mut R) -> Result<Vec<DataPoint>> {
    let angle = Uniform::new(0., PI)?;
    let noise = Normal::new(0., NOISE)?;
    let mut points = Vec::with_capacity(n_samples);

    for (label, count) in class_sizes(n_samples, n_classes) {
        let offset = if n_classes > 2 {
            (label / 2) as f32 * 0.5
        } else {
            0.
        };

        points.extend((0..count).map(|_| {
            rejection(&mut *rng, label, |rng| {
                let t: f32 = angle.sample(rng);
                let (mut px, mut py) = (t.cos(), t.sin());

                if label % 2 == 1 {
                    px = 1. - px;
                    py = 0.5 - py;
                }

                (
                    (px - 0.5) * 0.8 + noise.sample(rng),
                    (py + offset - 0.25) * 0.8 + noise.sample(rng),
                )
            })
        }));
    }

    Ok(points)
}

/// Draws a random class per point and places it around that class' center, displaced by
/// `displace`.
fn blobs<R, F>(n_samples: usize, n_classes: usize, rng: &mut R, displace: F) -> Result<Vec<DataPoint>>
where
    R: Rng,
    F: Fn(&mut R, &Normal<f32>) -> (f32, f32),
{
    let centers = centers(n_classes, 0.6);
    let noise = Normal::new(0., BLOB_STD)?;

    let points = (0..n_samples)
        .map(|_| {
            let label = rng.random_range(0..n_classes);
            let (cx, cy) = centers[label];

            rejection(&mut *rng, label, |rng| {
                let (dx, dy) = displace(rng, &noise);
                (cx + dx, cy + dy)
            })
        })
        .collect();

    Ok(points)
}

fn varied_variance<R: Rng>(
    n_samples: usize,
    n_classes: usize,
    rng: &mut R,
) -> Result<Vec<DataPoint>> {
    let centers = centers(n_classes, 0.6);
    let mut points = Vec::with_capacity(n_samples);

    for (label, count) in class_sizes(n_samples, n_classes) {
        let (cx, cy) = centers[label];
        let noise = Normal::new(0., 0.05 + label as f32 * 0.1)?;

        points.extend((0..count).map(|_| {
            rejection(&mut *rng, label, |rng| {
                (cx + noise.sample(rng), cy + noise.sample(rng))
            })
        }));
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    const ALL: [Distribution; 5] = [
        Distribution::Circles,
        Distribution::Moons,
        Distribution::Blobs,
        Distribution::Anisotropic,
        Distribution::VariedVariance,
    ];

    #[test]
    fn parse_names() {
        assert_eq!("moons".parse::<Distribution>().unwrap(), Distribution::Moons);
        assert_eq!(
            "varied_variance".parse::<Distribution>().unwrap(),
            Distribution::VariedVariance
        );

        let err = "spirals".parse::<Distribution>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown distribution: spirals");
    }

    #[test]
    fn inside_the_unit_square() {
        let mut rng = StdRng::seed_from_u64(11);

        for distribution in ALL {
            let points = distribution.generate(200, 4, &mut rng).unwrap();

            assert_eq!(points.len(), 200);
            assert!(points.iter().all(|p| p.x.abs() <= 1. && p.y.abs() <= 1.));
            assert!(points.iter().all(|p| p.label < 4));
        }
    }

    #[test]
    fn every_class_is_present() {
        let mut rng = StdRng::seed_from_u64(5);

        for distribution in [Distribution::Circles, Distribution::Moons, Distribution::VariedVariance] {
            let points = distribution.generate(200, 3, &mut rng).unwrap();
            let labels: BTreeSet<_> = points.iter().map(|p| p.label).collect();

            assert_eq!(labels, BTreeSet::from([0, 1, 2]));
        }
    }

    #[test]
    fn uneven_split() {
        let sizes: Vec<_> = class_sizes(200, 3).collect();
        assert_eq!(sizes, [(0, 66), (1, 66), (2, 68)]);
    }

    #[test]
    fn no_classes() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(Distribution::Blobs.generate(10, 0, &mut rng).is_err());
    }
}
