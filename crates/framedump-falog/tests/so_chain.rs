//! Stream-output chains through the public API: two pre-skinning passes
//! whose targets feed different later draw calls.

use framedump_falog::{
    find_stream_output_vertex_buffers, open_frame_analysis_log, Slot, SlotType, VbSoMapEntry,
};
use std::fs;

const LOG: &str = "\
000002 SOSetTargets(NumBuffers:2, ppSOTargets:0x1111, pOffsets:0x2222)
       0: resource=0x00000a00 hash=11111111
       1: resource=0x00000b00 hash=22222222
000002 Draw(VertexCount:24, StartVertexLocation:0)
000003 SOSetTargets(NumBuffers:0, ppSOTargets:0x0, pOffsets:0x0)
000004 IASetVertexBuffers(StartSlot:0, NumBuffers:1, ppVertexBuffers:0x1, pStrides:0x2, pOffsets:0x3)
       0: resource=0x00000a00 hash=11111111
000004 DrawIndexed(IndexCount:36, StartIndexLocation:0, BaseVertexLocation:0)
000005 IASetVertexBuffers(StartSlot:0, NumBuffers:1, ppVertexBuffers:0x1, pStrides:0x2, pOffsets:0x3)
       0: resource=0x00000b00 hash=22222222
000005 DrawIndexed(IndexCount:36, StartIndexLocation:0, BaseVertexLocation:0)
000006 IASetVertexBuffers(StartSlot:0, NumBuffers:1, ppVertexBuffers:0x0, pStrides:0x0, pOffsets:0x0)
";

#[test]
fn each_stream_output_target_maps_to_its_own_consumer() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("log.txt"), LOG).unwrap();

    let log = open_frame_analysis_log(dir.path()).unwrap();
    assert_eq!(log.last_draw_call, 6);

    // Both targets sat in SO slots of the same pass at draw call 2.
    let so = log.slots(SlotType::StreamOutput);
    assert_eq!(so.at(2).len(), 2);
    assert!(so.at(3).is_empty());

    let map = find_stream_output_vertex_buffers(&log);
    assert_eq!(
        map.get(&VbSoMapEntry {
            draw_call: 4,
            slot: Slot::Index(0)
        }),
        Some(&VbSoMapEntry {
            draw_call: 2,
            slot: Slot::Index(0)
        })
    );
    assert_eq!(
        map.get(&VbSoMapEntry {
            draw_call: 5,
            slot: Slot::Index(0)
        }),
        Some(&VbSoMapEntry {
            draw_call: 2,
            slot: Slot::Index(1)
        })
    );
    // Nothing consumed either target after it was replaced.
    assert!(!map.contains_key(&VbSoMapEntry {
        draw_call: 6,
        slot: Slot::Index(0)
    }));
}
