use commonware_dkg::bls12381::dkg::{channel, Arbiter, Config, Dealer, Player};
use criterion::{criterion_group, BatchSize, Criterion};
use rand::{rngs::StdRng, SeedableRng};
use std::{collections::BTreeMap, hint::black_box};

// Configure contributors based on context
#[cfg(not(full_bench))]
const CONTRIBUTORS: &[u32] = &[5, 10, 20, 50];
#[cfg(full_bench)]
const CONTRIBUTORS: &[u32] = &[5, 10, 20, 50, 100, 250, 500];
const CONCURRENCY: &[usize] = &[1, 4, 8];

fn benchmark_dkg_recovery(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    for &n in CONTRIBUTORS {
        let Ok(base) = Config::quorum(n) else {
            continue;
        };
        for &concurrency in CONCURRENCY {
            let config = base.with_concurrency(concurrency);
            c.bench_function(
                &format!(
                    "{}/n={} t={} conc={}",
                    module_path!(),
                    n,
                    config.t(),
                    concurrency
                ),
                |b| {
                    b.iter_batched(
                        || {
                            // Generate encryption keys
                            let keys = config
                                .indices()
                                .map(|i| (i, channel::generate(&mut rng).unwrap()))
                                .collect::<BTreeMap<_, _>>();
                            let public = keys
                                .iter()
                                .map(|(i, (_, pk))| (*i, pk.clone()))
                                .collect::<BTreeMap<_, _>>();

                            // Deal from every participant
                            let mut arbiter = Arbiter::new(config, public.clone()).unwrap();
                            let mut dealings = BTreeMap::new();
                            for (i, (sk, _)) in &keys {
                                let (_, dealing) =
                                    Dealer::new(&mut rng, config, *i, sk, &public).unwrap();
                                arbiter
                                    .commitment(
                                        *i,
                                        dealing.commitment.clone(),
                                        dealing.root,
                                        dealing.encrypted.clone(),
                                    )
                                    .unwrap();
                                dealings.insert(*i, dealing);
                            }
                            let (output, _) = arbiter.finalize();
                            let output = output.unwrap();

                            // Receive every dealing as the first participant
                            let (sk, _) = keys.into_iter().next().unwrap().1;
                            let mut player = Player::new(config, 1, sk, public).unwrap();
                            for (dealer, dealing) in dealings {
                                if dealer == 1 {
                                    player.own(dealing.commitment, dealing.share).unwrap();
                                } else {
                                    player
                                        .share(dealer, dealing.commitment, &dealing.encrypted[&1])
                                        .unwrap();
                                }
                            }
                            (player, output.commitments)
                        },
                        |(player, commitments)| {
                            black_box(player.finalize(&commitments).unwrap());
                        },
                        BatchSize::SmallInput,
                    );
                },
            );
        }
    }
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = benchmark_dkg_recovery
}
