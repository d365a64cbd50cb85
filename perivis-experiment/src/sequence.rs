use perivis_core::{Shape, Trial};
use rand::Rng;
use rand::seq::SliceRandom;

/// Builds the randomized trial list: the full shape × position
/// cross-product (shapes outer, positions inner, declared order),
/// followed by a uniform Fisher-Yates shuffle. Empty input sets yield
/// an empty list.
pub fn generate<R: Rng>(shapes: &[Shape], positions: &[u16], rng: &mut R) -> Vec<Trial> {
    let mut sequence = Vec::with_capacity(shapes.len() * positions.len());
    for &shape in shapes {
        for &position in positions {
            sequence.push(Trial::new(shape, position));
        }
    }
    sequence.shuffle(rng);
    sequence
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn key(trial: &Trial) -> (u8, u16) {
        (trial.shape as u8, trial.position)
    }

    #[test]
    fn covers_the_full_cross_product_exactly_once() {
        let mut rng = StdRng::seed_from_u64(7);
        let positions: Vec<u16> = (0..8).map(|i| i * 45).collect();
        let sequence = generate(&Shape::ALL, &positions, &mut rng);
        assert_eq!(sequence.len(), 40);

        let mut seen: Vec<(u8, u16)> = sequence.iter().map(key).collect();
        seen.sort_unstable();
        let mut expected: Vec<(u8, u16)> = Shape::ALL
            .iter()
            .flat_map(|&s| positions.iter().map(move |&p| (s as u8, p)))
            .collect();
        expected.sort_unstable();
        assert_eq!(seen, expected);
        assert!(sequence.iter().all(|t| !t.is_retry));
    }

    #[test]
    fn two_shapes_two_positions() {
        let mut rng = StdRng::seed_from_u64(1);
        let sequence = generate(&[Shape::Circle, Shape::Square], &[0, 180], &mut rng);
        assert_eq!(sequence.len(), 4);
        let mut seen: Vec<(u8, u16)> = sequence.iter().map(key).collect();
        seen.sort_unstable();
        assert_eq!(
            seen,
            vec![
                (Shape::Circle as u8, 0),
                (Shape::Circle as u8, 180),
                (Shape::Square as u8, 0),
                (Shape::Square as u8, 180),
            ]
        );
    }

    #[test]
    fn empty_inputs_yield_an_empty_sequence() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generate(&[], &[0, 90], &mut rng).is_empty());
        assert!(generate(&Shape::ALL, &[], &mut rng).is_empty());
    }

    #[test]
    fn different_seeds_are_permutations_of_the_same_trials() {
        let positions = [0, 90, 180, 270];
        let mut a = generate(&Shape::ALL, &positions, &mut StdRng::seed_from_u64(2));
        let mut b = generate(&Shape::ALL, &positions, &mut StdRng::seed_from_u64(3));
        a.sort_unstable_by_key(key);
        b.sort_unstable_by_key(key);
        assert_eq!(a, b);
    }
}
