// ABOUTME: Random number builtins with a seedable thread-local generator

use std::cell::RefCell;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::values::Value;

thread_local! {
    static RNG: RefCell<StdRng> = RefCell::new(StdRng::from_entropy());
}

define_native! {
    func_random,
    name: "random",
    params: ["a", "b"],
    info: "random()\nrandom(a)\nrandom(a, b)\n\nReturns a random number. Without arguments, a decimal in [0, 1).\nWith a, an int in [0, a). With a and b, an int in [a, b).",
    |args, _env, _pos| {
        if args.has_arg("a") && !args.has_arg("b") {
            let max = args.get_int("a")?;
            if max <= 0 {
                return Ok(Value::int(0));
            }
            return Ok(Value::int(RNG.with(|rng| rng.borrow_mut().gen_range(0..max))));
        }
        if args.has_arg("a") && args.has_arg("b") {
            let min = args.get_int("a")?;
            let max = args.get_int("b")?;
            if max <= min {
                return Ok(Value::int(min));
            }
            return Ok(Value::int(
                RNG.with(|rng| rng.borrow_mut().gen_range(min..max)),
            ));
        }
        Ok(Value::decimal(RNG.with(|rng| rng.borrow_mut().gen::<f64>())))
    }
}

define_native! {
    func_set_seed,
    name: "set_seed",
    params: ["n"],
    info: "set_seed(n)\n\nSets the seed of the random number generator to n. Sequences after the\nsame seed are deterministic.\n\n: set_seed(1) ==> 1",
    |args, _env, _pos| {
        let n = args.get_int("n")?;
        RNG.with(|rng| *rng.borrow_mut() = StdRng::seed_from_u64(n as u64));
        Ok(Value::int(n))
    }
}
