use canlr::syntax;
use std::{env, path::PathBuf};

macro_rules! define_tests {
    ($($name:ident => $lr1:expr),*$(,)?) => {$(
        #[test]
        fn $name() {
            let grammar = syntax::parse_file(
                &PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap())
                    .join(concat!("tests/", stringify!($name), ".bnf"))
            ).unwrap();
            let build = canlr::build(&grammar).unwrap();
            assert_eq!(build.table.num_states(), build.num_states());
            assert_eq!(build.table.is_lr1(), $lr1, "{}", build.table.display(&grammar));
        }
    )*};
}

define_tests! {
    arithmetic => true,
    dragon => true,
    nullable => true,
    lvalue => true,
    lists => true,
    ambiguous => false,
}
