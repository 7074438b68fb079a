use configuration::SplitStrategy;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Row indices of the training and held-out partitions, each in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Splits `n` rows into train/held-out sets.
///
/// The held-out size is `ceil(n * test_fraction)`, at least one row, while
/// always leaving two training rows. With fewer than three rows nothing is held
/// out and `test` is empty.
pub fn partition(n: usize, test_fraction: f64, strategy: SplitStrategy, seed: u64) -> Partition {
    let n_test = held_out_size(n, test_fraction);

    let (mut train, mut test) = match strategy {
        SplitStrategy::Tail => ((0..n - n_test).collect::<Vec<_>>(), (n - n_test..n).collect::<Vec<_>>()),
        SplitStrategy::Shuffled => {
            let mut order: Vec<usize> = (0..n).collect();
            let mut rng = StdRng::seed_from_u64(seed);
            order.shuffle(&mut rng);
            let train = order.split_off(n_test);
            (train, order)
        }
    };

    train.sort_unstable();
    test.sort_unstable();
    Partition { train, test }
}

fn held_out_size(n: usize, test_fraction: f64) -> usize {
    if n < 3 {
        return 0;
    }
    let wanted = (n as f64 * test_fraction).ceil() as usize;
    wanted.clamp(1, n - 2)
}
