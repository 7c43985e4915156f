use std::collections::BTreeMap;
use std::path::PathBuf;

use rstest::*;
use tempfile::TempDir;

use mgread_core::{ReaderConfig, ReaderError};
use mgread_coords::{
    CoordSession, ModelSelector, RegionOrderKey, SAMPLE_COORDS_FIXTURE, SampleCoords,
};

#[fixture]
fn fixture_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

#[fixture]
fn sample() -> SampleCoords {
    SampleCoords::new().with_rows(2..6)
}

fn config_for(dir: &TempDir) -> ReaderConfig {
    ReaderConfig::builder()
        .with_fixture_dir(PathBuf::from(dir.path()))
        .with_page_size(10)
        .finish()
        .unwrap()
}

fn open_test_session(dir: &TempDir, sample: &SampleCoords) -> CoordSession {
    CoordSession::open_with_sample(&config_for(dir), "test", "", None, sample).unwrap()
}

/// A chromosome with more than one region, with its regions.
fn crowded_chromosome(session: &CoordSession) -> Option<(String, Vec<String>)> {
    session
        .get_chromosomes()
        .unwrap()
        .into_iter()
        .map(|c| {
            let regions = session.get_regions(&c, 0, 300_000_000).unwrap();
            (c, regions)
        })
        .find(|(_, regions)| regions.len() > 1)
}

mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[rstest]
    fn test_fixture_generated_on_first_open(fixture_dir: TempDir, sample: SampleCoords) {
        let path = fixture_dir.path().join(SAMPLE_COORDS_FIXTURE);
        assert!(!path.exists());

        let session = open_test_session(&fixture_dir, &sample);
        assert!(path.is_file());
        assert!(!session.list_resolutions().unwrap().is_empty());

        // a second open reuses the file
        let modified = std::fs::metadata(&path).unwrap().modified().unwrap();
        let _again = open_test_session(&fixture_dir, &sample);
        assert_eq!(
            std::fs::metadata(&path).unwrap().modified().unwrap(),
            modified
        );
    }

    #[rstest]
    fn test_set_resolution(fixture_dir: TempDir, sample: SampleCoords) {
        let mut session = open_test_session(&fixture_dir, &sample);
        let resolutions = session.list_resolutions().unwrap();

        assert_eq!(session.get_resolution().unwrap(), None);
        session.set_resolution(resolutions[0]).unwrap();
        assert_eq!(session.get_resolution().unwrap(), Some(resolutions[0]));
    }

    #[rstest]
    fn test_open_with_resolution(fixture_dir: TempDir, sample: SampleCoords) {
        let config = config_for(&fixture_dir);
        let session =
            CoordSession::open_with_sample(&config, "test", "", Some(1000), &sample).unwrap();
        assert_eq!(session.get_resolution().unwrap(), Some(1000));

        let missing = CoordSession::open_with_sample(&config, "test", "", Some(7), &sample);
        assert!(matches!(missing, Err(ReaderError::NotFound(_))));
    }

    #[rstest]
    fn test_chromosomes_need_resolution(fixture_dir: TempDir, sample: SampleCoords) {
        let mut session = open_test_session(&fixture_dir, &sample);
        assert!(session.get_chromosomes().unwrap().is_empty());

        session.set_resolution(1000).unwrap();
        let chromosomes = session.get_chromosomes().unwrap();
        assert!(!chromosomes.is_empty());
        let mut sorted = chromosomes.clone();
        sorted.sort();
        assert_eq!(chromosomes, sorted);
    }

    #[rstest]
    fn test_regions_cover_every_region(fixture_dir: TempDir, sample: SampleCoords) {
        let mut session = open_test_session(&fixture_dir, &sample);
        session.set_resolution(1000).unwrap();

        let total: usize = session
            .get_chromosomes()
            .unwrap()
            .iter()
            .map(|c| session.get_regions(c, 0, 300_000_000).unwrap().len())
            .sum();
        assert_eq!(total, 10);
    }

    #[rstest]
    fn test_regions_half_open(fixture_dir: TempDir, sample: SampleCoords) {
        let mut session = open_test_session(&fixture_dir, &sample);
        let view = session.set_resolution(1000).unwrap();
        let entry = view.region("0").unwrap().clone();

        // a query ending exactly at the region start does not overlap it
        let before = view.regions(&entry.chromosome, entry.start - 10, entry.start);
        assert!(!before.contains(&entry.id));
        let touching = view.regions(&entry.chromosome, entry.start - 10, entry.start + 1);
        assert!(touching.contains(&entry.id));
        let after = view.regions(&entry.chromosome, entry.end, entry.end + 10);
        assert!(!after.contains(&entry.id));
    }

    #[rstest]
    fn test_region_order(fixture_dir: TempDir, sample: SampleCoords) {
        let mut session = open_test_session(&fixture_dir, &sample);
        let view = session.set_resolution(1000).unwrap();

        for chromosome in view.chromosomes() {
            let order = view
                .region_order(&RegionOrderKey::Chromosome(chromosome.clone()))
                .unwrap();
            let starts: Vec<i64> = order
                .iter()
                .map(|r| view.region(r).unwrap().start)
                .collect();
            assert!(starts.windows(2).all(|w| w[0] <= w[1]));

            // ordering through any of its regions gives the same list
            let by_region = view
                .region_order(&RegionOrderKey::Region(order[0].clone()))
                .unwrap();
            assert_eq!(by_region, order);
        }

        assert!(matches!(
            view.region_order(&RegionOrderKey::Region("nope".into())),
            Err(ReaderError::NotFound(_))
        ));
    }

    #[rstest]
    fn test_object_header(fixture_dir: TempDir, sample: SampleCoords) {
        let mut session = open_test_session(&fixture_dir, &sample);
        session.set_resolution(1000).unwrap();

        let header = session.get_region_header("3").unwrap().unwrap();
        assert_eq!(header.assembly, "assembly");
        assert_eq!(header.uuid, "3");
        assert_eq!(header.chrom_start, vec![header.start]);
        assert_eq!(header.chrom_end, vec![header.end]);
    }

    #[rstest]
    fn test_clusters_and_centroids(fixture_dir: TempDir, sample: SampleCoords) {
        let mut session = open_test_session(&fixture_dir, &sample);
        session.set_resolution(1000).unwrap();

        let clusters = session.get_clusters("0").unwrap();
        assert_eq!(clusters.len(), 4);
        assert_eq!(clusters[0], vec![0, 1, 2]);
        assert_eq!(session.get_centroids("0").unwrap(), vec![1, 10, 100, 150, 200]);
    }

    #[rstest]
    fn test_models_table(fixture_dir: TempDir, sample: SampleCoords) {
        let mut session = open_test_session(&fixture_dir, &sample);
        session.set_resolution(1000).unwrap();

        let models = session.get_models("2").unwrap();
        assert_eq!(models.shape(), &[1000, 2]);
        assert!(models.column(1).iter().all(|c| (0..=6).contains(c)));
    }

    #[rstest]
    fn test_page_of_all_models(fixture_dir: TempDir, sample: SampleCoords) {
        let mut session = open_test_session(&fixture_dir, &sample);
        let view = session.set_resolution(1000).unwrap();
        let entry = view.region("1").unwrap().clone();

        let (page, meta) = view
            .model_page("1", &ModelSelector::AllInRegion, 0, 10)
            .unwrap();
        assert_eq!(meta.model_count, 1000);
        assert_eq!(meta.page_count, 100);
        assert_eq!(page.models.len(), 10);
        assert_eq!(page.models[0].model_ref, "0");
        assert_eq!(page.models[0].data.len(), (entry.j - entry.i) * 3);
        assert_eq!(page.clusters.len(), 4);
        assert_eq!(page.centroids.len(), 5);
        assert_eq!(page.metadata, serde_json::json!({}));
        assert_eq!(page.restraints, serde_json::json!([]));
        assert_eq!(page.hic_data, serde_json::json!({}));
    }

    #[rstest]
    fn test_page_of_centroids(fixture_dir: TempDir, sample: SampleCoords) {
        let mut session = open_test_session(&fixture_dir, &sample);
        session.set_resolution(1000).unwrap();

        let (page, meta) = session
            .get_model("0", &ModelSelector::Centroids, 0, 10)
            .unwrap()
            .unwrap();
        assert_eq!(meta.model_count, 5);
        assert_eq!(meta.page_count, 1);
        let refs: Vec<&str> = page.models.iter().map(|m| m.model_ref.as_str()).collect();
        assert_eq!(refs, vec!["1", "10", "100", "150", "200"]);
    }

    #[rstest]
    fn test_pages_concatenate(fixture_dir: TempDir, sample: SampleCoords) {
        let mut session = open_test_session(&fixture_dir, &sample);
        let view = session.set_resolution(1000).unwrap();
        let selector = ModelSelector::Explicit(vec![42, 7, 900, 3, 7, 512, 8]);

        let mut seen = vec![];
        let mut page = 0;
        let page_count = loop {
            match view.model_page("4", &selector, page, 3) {
                Ok((chunk, meta)) => {
                    assert!(chunk.models.len() <= 3);
                    seen.extend(chunk.models.into_iter().map(|m| m.model_ref));
                    page += 1;
                    if page == meta.page_count {
                        break meta.page_count;
                    }
                }
                Err(e) => panic!("page {} failed: {}", page, e),
            }
        };
        assert_eq!(page_count, 2);
        assert_eq!(seen, vec!["3", "7", "8", "42", "512", "900"]);

        assert!(matches!(
            view.model_page("4", &selector, 2, 3),
            Err(ReaderError::OutOfRange { page: 2, page_count: 2 })
        ));
    }

    #[rstest]
    fn test_page_size_clamped(fixture_dir: TempDir, sample: SampleCoords) {
        let mut session = open_test_session(&fixture_dir, &sample);
        let view = session.set_resolution(1000).unwrap();

        let (big, big_meta) = view
            .model_page("0", &ModelSelector::AllInRegion, 2, 500)
            .unwrap();
        let (hundred, hundred_meta) = view
            .model_page("0", &ModelSelector::AllInRegion, 2, 100)
            .unwrap();
        assert_eq!(big_meta, hundred_meta);
        assert_eq!(big_meta.page_count, 10);
        assert_eq!(big, hundred);

        assert!(matches!(
            view.model_page("0", &ModelSelector::AllInRegion, 0, 0),
            Err(ReaderError::InvalidArgument(_))
        ));
    }

    #[rstest]
    fn test_unknown_model_id(fixture_dir: TempDir, sample: SampleCoords) {
        let mut session = open_test_session(&fixture_dir, &sample);
        let view = session.set_resolution(1000).unwrap();

        assert!(matches!(
            view.model_page("0", &ModelSelector::Explicit(vec![1, 5000]), 0, 10),
            Err(ReaderError::NotFound(_))
        ));
        assert!(matches!(
            view.model_page("0", &ModelSelector::Explicit(vec![]), 0, 10),
            Err(ReaderError::InvalidArgument(_))
        ));
        assert!(matches!(
            view.model_page("missing", &ModelSelector::Centroids, 0, 10),
            Err(ReaderError::NotFound(_))
        ));
    }

    #[rstest]
    fn test_model_coords_length(fixture_dir: TempDir, sample: SampleCoords) {
        let mut session = open_test_session(&fixture_dir, &sample);
        session.set_resolution(1000).unwrap();

        let view = session.bound().unwrap();
        for region in view.index().regions.values() {
            let coords = view.model_coords(&region.id, 999).unwrap();
            assert_eq!(coords.len(), region.j - region.i);
            assert!(
                coords
                    .iter()
                    .flatten()
                    .all(|v| (-1000..=1000).contains(v))
            );
        }
    }

    #[rstest]
    fn test_regions_of_a_crowded_chromosome(fixture_dir: TempDir, sample: SampleCoords) {
        let mut session = open_test_session(&fixture_dir, &sample);
        session.set_resolution(1000).unwrap();

        // 10 regions on 7 chromosomes, at least one chromosome has two
        let (chromosome, regions) = crowded_chromosome(&session).unwrap();
        let order = session
            .get_region_order(&RegionOrderKey::Chromosome(chromosome))
            .unwrap();

        let mut from_order = order.clone();
        from_order.sort();
        let mut from_query = regions.clone();
        from_query.sort();
        assert_eq!(from_order, from_query);
    }

    #[rstest]
    fn test_json_response_shape(fixture_dir: TempDir, sample: SampleCoords) {
        let mut session = open_test_session(&fixture_dir, &sample);
        let view = session.set_resolution(1000).unwrap();

        let (page, meta) = view
            .model_page("5", &ModelSelector::Explicit(vec![10]), 0, 10)
            .unwrap();
        let json = serde_json::to_value(&page).unwrap();
        let keys: BTreeMap<String, ()> = json
            .as_object()
            .unwrap()
            .keys()
            .map(|k| (k.clone(), ()))
            .collect();
        assert_eq!(
            keys.into_keys().collect::<Vec<_>>(),
            vec![
                "centroids",
                "clusters",
                "hic_data",
                "metadata",
                "models",
                "object",
                "restraints"
            ]
        );
        assert_eq!(json["models"][0]["ref"], "10");
        assert_eq!(
            serde_json::to_value(meta).unwrap(),
            serde_json::json!({"model_count": 1, "page_count": 1})
        );
    }

    #[rstest]
    fn test_close_releases_store(fixture_dir: TempDir, sample: SampleCoords) {
        let mut session = open_test_session(&fixture_dir, &sample);
        session.set_resolution(1000).unwrap();
        session.close();

        assert!(matches!(session.get_resolution(), Err(ReaderError::Closed)));
        assert!(matches!(
            session.get_model("0", &ModelSelector::Centroids, 0, 10),
            Err(ReaderError::Closed)
        ));
    }
}
