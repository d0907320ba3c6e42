use particle_physics::{
    generate, DistributionPattern, DistributionRequest, InteractionMatrix, MatrixArchetype,
    MatrixSource,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn three_species_uniform_with_symmetric_matrix() {
    let mut rng = StdRng::seed_from_u64(9);
    let request = DistributionRequest {
        pattern: DistributionPattern::Uniform,
        particle_count: 1024,
        species_count: 3,
        ..Default::default()
    };

    let particles = generate(&request, &mut rng);
    let matrix = MatrixSource::Archetype(MatrixArchetype::SymmetricRandom).resolve(3, &mut rng);

    assert_eq!(particles.len(), 1024);
    assert!(particles.iter().all(|p| p.species < 3));
    for s in 0..3 {
        assert!(particles.iter().any(|p| p.species == s));
    }

    assert_eq!(matrix.size(), 3);
    assert!(matrix.is_symmetric());
    assert!(matrix.as_slice().iter().all(|v| (-1.0..=1.0).contains(v)));
}

#[test]
fn custom_matrix_is_padded_for_more_species() {
    let mut rng = StdRng::seed_from_u64(10);
    let custom = InteractionMatrix::from_rows(&[vec![1.0, -1.0], vec![-1.0, 1.0]]);

    let matrix = MatrixSource::Custom(custom).resolve(4, &mut rng);

    assert_eq!(
        matrix.rows(),
        vec![
            vec![1.0, -1.0, 0.0, 0.0],
            vec![-1.0, 1.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0],
        ]
    );
}

#[test]
fn custom_matrix_is_cropped_for_fewer_species() {
    let mut rng = StdRng::seed_from_u64(11);
    let custom = MatrixArchetype::FullRandom.generate(6, &mut rng);

    let matrix = MatrixSource::Custom(custom.clone()).resolve(2, &mut rng);

    assert_eq!(matrix.size(), 2);
    assert_eq!(matrix.get(1, 0), custom.get(1, 0));
    assert_eq!(matrix.get(0, 1), custom.get(0, 1));
}
