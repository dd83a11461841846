use latexlang_testing::run_random_round_trip_test;

macro_rules! random_round_trip_tests {
    ( $( ($name: ident, $seed: expr, $num_items: expr, $max_depth: expr), )+ ) => {
        $(
        #[test]
        fn $name() {
            run_random_round_trip_test($seed, $num_items, $max_depth);
        }
        )+
    };
}

random_round_trip_tests![
    (small_shallow, 1, 20, 1),
    (small_deep, 2, 20, 8),
    (medium, 3, 500, 4),
    (large, 4, 5000, 6),
    (very_deep, 5, 200, 32),
];

#[test]
fn many_seeds() {
    for seed in 100..150 {
        run_random_round_trip_test(seed, 100, 5);
    }
}
