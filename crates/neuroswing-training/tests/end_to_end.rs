use neuroswing_checkpoint::CheckpointStore;
use neuroswing_network::{Activation, Agent};
use neuroswing_training::{
    FitnessError, MutationParams, NetworkConfig, Pool, PoolConfig, PoolKind, Trainer,
    TrainingConfig,
};
use rand::SeedableRng as _;
use rand_pcg::Pcg64;

const FIRST_LAYER_WIDTH: usize = 10;

/// Deterministic stand-in for a simulation: rewards small first-layer biases.
fn negative_first_layer_bias(agent: &mut Agent) -> Result<f64, FitnessError> {
    for _ in 0..20 {
        agent.run(&[0.1, 0.2, 0.3, 0.4, 0.5])?;
    }
    let biases = &agent.genome().biases[..FIRST_LAYER_WIDTH];
    Ok(-biases.iter().sum::<f64>())
}

fn config(dir: &std::path::Path, kind: PoolKind) -> TrainingConfig {
    TrainingConfig {
        num_agents: 50,
        generations: 3,
        checkpoint_dir: dir.to_owned(),
        network: NetworkConfig {
            inputs: ["cart.x", "cart.vel", "bob.x", "bob.y", "bob.vel"]
                .map(str::to_owned)
                .to_vec(),
            outputs: vec!["acceleration".to_owned()],
            hidden: vec![FIRST_LAYER_WIDTH, 10],
            hidden_activation: Activation::Tanh,
            output_activation: Activation::Tanh,
            uniform_activation: false,
        },
        mutation: MutationParams {
            passes: 2,
            ..MutationParams::default()
        },
        pool: PoolConfig {
            kind,
            workers: 4,
            niceness: None,
        },
        ..TrainingConfig::default()
    }
}

fn train_three_generations(kind: PoolKind) {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path(), kind);
    let store = CheckpointStore::new(&cfg.checkpoint_dir);
    let pool = Pool::new(&cfg.pool).unwrap();
    let mut trainer = Trainer::new(
        cfg,
        store.clone(),
        negative_first_layer_bias,
        pool,
        Pcg64::seed_from_u64(2024),
    )
    .unwrap();

    let initial_best = trainer
        .population()
        .genomes()
        .iter()
        .map(|g| -g.biases[..FIRST_LAYER_WIDTH].iter().sum::<f64>())
        .fold(f64::NEG_INFINITY, f64::max);

    let summary = trainer.run().unwrap();
    assert_eq!(summary.generations, 3);
    assert_eq!(summary.total_ticks, 3 * 50 * 20);
    assert_eq!(trainer.last_generation(), Some(2));

    assert_eq!(store.latest_generation().unwrap(), Some(2));
    let mut previous_best = initial_best;
    for generation in 0..3 {
        let checkpoint = store.load(generation).unwrap().unwrap();
        assert_eq!(checkpoint.generation, generation);
        assert_eq!(checkpoint.layers, vec![5, 10, 10, 1]);
        assert_eq!(checkpoint.weights.len(), 5 * 10 + 10 * 10 + 10);
        assert_eq!(checkpoint.biases.len(), 21);
        assert_eq!(checkpoint.ticks, (generation + 1) * 50 * 20);
        let best = checkpoint.best_score.unwrap();
        assert!(
            best >= previous_best - 1e-9,
            "generation {generation} regressed: {best} < {previous_best}"
        );
        previous_best = best;
    }

    let last = store.load_latest().unwrap().unwrap();
    assert_eq!(last.generation, 2);
    assert!(last.best_score.unwrap() >= initial_best - 1e-9);
}

#[test]
fn test_end_to_end_rayon() {
    train_three_generations(PoolKind::Rayon);
}

#[test]
fn test_end_to_end_scoped() {
    train_three_generations(PoolKind::Scoped);
}

#[test]
fn test_end_to_end_sequential() {
    train_three_generations(PoolKind::Sequential);
}

#[test]
fn test_uniform_activation_survives_resume() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(dir.path(), PoolKind::Sequential);
    cfg.network.uniform_activation = true;
    cfg.network.output_activation = Activation::Sigmoid;
    cfg.generations = 2;
    let store = CheckpointStore::new(dir.path());

    let mut trainer = Trainer::new(
        cfg.clone(),
        store.clone(),
        negative_first_layer_bias,
        Pool::new(&cfg.pool).unwrap(),
        Pcg64::seed_from_u64(7),
    )
    .unwrap();
    trainer.run().unwrap();
    drop(trainer);

    let checkpoint = store.load_latest().unwrap().unwrap();
    assert!(checkpoint.uniform_activation);
    assert_eq!(checkpoint.output_activation, Activation::Sigmoid);

    // a fresh config without the flag must not override the checkpoint
    cfg.network.uniform_activation = false;
    let resumed = Trainer::new(
        cfg.clone(),
        store,
        negative_first_layer_bias,
        Pool::new(&cfg.pool).unwrap(),
        Pcg64::seed_from_u64(8),
    )
    .unwrap();
    assert!(resumed.population().activations().uniform);
    assert_eq!(resumed.last_generation(), Some(1));
}
